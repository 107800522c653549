//! Create-invoice actions
//!
//! The backend call that turns a submission into an invoice. The processor
//! only sees the [`CreateInvoiceAction`] trait.

mod http;

pub use http::{DEFAULT_TIMEOUT_SECS, HttpInvoiceAction};

use crate::error::Result;
use crate::types::PendingSubmission;
use async_trait::async_trait;
use serde::Deserialize;

/// Outcome of a create-invoice call that reached the backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CreateInvoiceResponse {
    /// Invoice created
    #[serde(rename_all = "camelCase")]
    Created {
        /// Backend identifier of the new invoice
        invoice_id: String,
    },
    /// Backend refused the submission
    Rejected {
        /// Machine-readable error code
        code: String,
        /// Human-readable message
        message: String,
    },
}

impl CreateInvoiceResponse {
    /// Successful response
    pub fn created(invoice_id: impl Into<String>) -> Self {
        Self::Created {
            invoice_id: invoice_id.into(),
        }
    }

    /// Error-shaped response
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// External "create invoice" call
///
/// An `Err` is treated exactly like a [`CreateInvoiceResponse::Rejected`]:
/// the submission fails with the error's message.
#[async_trait]
pub trait CreateInvoiceAction: Send + Sync {
    /// Create an invoice from one submission
    async fn create_invoice(&self, submission: &PendingSubmission) -> Result<CreateInvoiceResponse>;
}

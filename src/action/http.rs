//! HTTP create-invoice action

use crate::action::{CreateInvoiceAction, CreateInvoiceResponse};
use crate::error::{Error, Result};
use crate::types::{Adjustments, PendingSubmission};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateInvoicePayload<'a> {
    file_name: &'a str,
    mime_type: &'a str,
    base64_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    adjustments: Option<Adjustments>,
}

/// Posts submissions as base64 JSON to an invoice endpoint
pub struct HttpInvoiceAction {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpInvoiceAction {
    /// Create an action posting to `endpoint`, authenticating with an
    /// optional bearer token
    pub fn new(endpoint: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(Error::Config("invoice endpoint is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

#[async_trait]
impl CreateInvoiceAction for HttpInvoiceAction {
    async fn create_invoice(&self, submission: &PendingSubmission) -> Result<CreateInvoiceResponse> {
        debug!(id = %submission.id, name = %submission.name, "creating invoice");

        let payload = CreateInvoicePayload {
            file_name: &submission.name,
            mime_type: &submission.mime_type,
            base64_data: base64::engine::general_purpose::STANDARD.encode(&submission.payload),
            adjustments: submission.adjustments,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let parsed: CreateInvoiceResponse = serde_json::from_str(&body)?;
            debug!(id = %submission.id, ?parsed, "invoice endpoint responded");
            return Ok(parsed);
        }

        debug!(id = %submission.id, %status, "invoice endpoint returned error status");
        match serde_json::from_str::<CreateInvoiceResponse>(&body) {
            Ok(rejected @ CreateInvoiceResponse::Rejected { .. }) => Ok(rejected),
            _ => Ok(CreateInvoiceResponse::rejected(
                format!("HTTP_{}", status.as_u16()),
                format!("Upload failed with status {}", status.as_u16()),
            )),
        }
    }
}

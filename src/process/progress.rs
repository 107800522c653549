//! Progress callback trait for interface-agnostic updates
//!
//! This trait allows different hosts (CLI, UI bridge, etc.) to receive
//! progress updates while a batch is processed.

use crate::types::PendingSubmission;
use async_trait::async_trait;

/// Batch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Selecting eligible submissions and marking them as creating
    Preparing,
    /// Create-invoice calls outstanding
    Creating,
    /// Every call has resolved
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preparing => write!(f, "Preparing"),
            Self::Creating => write!(f, "Creating invoices"),
            Self::Complete => write!(f, "Done"),
        }
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during processing.
/// Completions arrive in whatever order the backend answers.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called when the create-invoice call for a submission starts
    async fn on_submission_started(&self, submission: &PendingSubmission);

    /// Called when an invoice was created
    async fn on_invoice_created(&self, submission: &PendingSubmission, invoice_id: &str);

    /// Called when a submission failed (non-fatal for the batch)
    async fn on_submission_failed(&self, submission: &PendingSubmission, message: &str);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_submission_started(&self, _submission: &PendingSubmission) {}
    async fn on_invoice_created(&self, _submission: &PendingSubmission, _invoice_id: &str) {}
    async fn on_submission_failed(&self, _submission: &PendingSubmission, _message: &str) {}
    async fn on_message(&self, _message: &str) {}
}

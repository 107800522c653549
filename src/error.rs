//! Error types for receipt-intake

use crate::types::{SubmissionId, SubmissionStatus};
use thiserror::Error;

/// Library error type
#[derive(Error, Debug)]
pub enum Error {
    /// No submission with this id is present in the store
    #[error("submission not found: {0}")]
    SubmissionNotFound(SubmissionId),

    /// A submission with this id is already present in the store
    #[error("submission already present: {0}")]
    DuplicateSubmission(SubmissionId),

    /// Status change outside the lifecycle graph
    #[error("invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition {
        /// Submission the transition was attempted on
        id: SubmissionId,
        /// Current status
        from: SubmissionStatus,
        /// Requested status
        to: SubmissionStatus,
    },

    /// Rotation requested on a non-image submission
    #[error("rotation unsupported for this type: {0}")]
    RotationUnsupported(String),

    /// Adjustment value out of range, or adjustments on a PDF
    #[error("invalid adjustment: {0}")]
    InvalidAdjustment(String),

    /// Rename with an empty or unusable name
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Image payload could not be decoded or re-encoded
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Failure reported by the create-invoice action
    #[error("{0}")]
    Action(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("{0}")]
    InvalidArgument(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

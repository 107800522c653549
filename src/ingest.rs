//! File ingestion
//!
//! Validates raw file inputs and turns the accepted ones into
//! [`PendingSubmission`] records, allocating one preview per accepted file.

use crate::preview::ResourceReclaimer;
use crate::types::{Adjustments, PendingSubmission, RawFile, ScanKind, SubmissionId, SubmissionStatus};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Largest accepted file, in bytes (10 MiB)
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// MIME types accepted at ingestion
pub const SUPPORTED_MIME_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "application/pdf"];

/// Limits applied during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestLimits {
    /// Largest accepted file, in bytes
    pub max_file_size: u64,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

/// Why a file was refused at ingestion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// MIME type outside the supported set
    #[error("Unsupported file type: {mime_type}. Please upload JPEG, PNG, or PDF files.")]
    InvalidType {
        /// Declared MIME type
        mime_type: String,
    },

    /// File larger than the configured limit
    #[error(
        "File size too large: {}. Maximum allowed size is {}.",
        megabytes(.size),
        limit_megabytes(.max)
    )]
    FileTooLarge {
        /// File size in bytes
        size: u64,
        /// Limit in bytes
        max: u64,
    },
}

impl ValidationError {
    /// Stable error code reported to callers
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidType { .. } => "INVALID_TYPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: &u64) -> String {
    format!("{:.1}MB", *bytes as f64 / BYTES_PER_MB)
}

/// Whole-megabyte limits print without a decimal
fn limit_megabytes(bytes: &u64) -> String {
    if bytes % (1024 * 1024) == 0 {
        format!("{}MB", bytes / (1024 * 1024))
    } else {
        megabytes(bytes)
    }
}

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A file that did not become a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    /// File name as selected
    pub name: String,
    /// Reason for the rejection
    pub error: ValidationError,
}

impl RejectedFile {
    /// Error code of the rejection
    pub const fn code(&self) -> &'static str {
        self.error.code()
    }
}

/// Result of ingesting a batch of files
#[derive(Debug, Default)]
pub struct IngestReport {
    /// New submissions, in input order
    pub accepted: Vec<PendingSubmission>,
    /// Files refused by validation
    pub rejected: Vec<RejectedFile>,
}

/// Validates files and builds submissions
pub struct FileIngestor {
    limits: IngestLimits,
    reclaimer: Arc<ResourceReclaimer>,
}

impl FileIngestor {
    /// Create an ingestor allocating previews through `reclaimer`
    pub const fn new(limits: IngestLimits, reclaimer: Arc<ResourceReclaimer>) -> Self {
        Self { limits, reclaimer }
    }

    /// Limits in effect
    pub const fn limits(&self) -> IngestLimits {
        self.limits
    }

    /// Check a file against the type and size rules
    pub fn validate(&self, file: &RawFile) -> Result<ScanKind, ValidationError> {
        let Some(kind) = ScanKind::from_mime(&file.mime_type) else {
            return Err(ValidationError::InvalidType {
                mime_type: file.mime_type.clone(),
            });
        };

        if file.size() > self.limits.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: file.size(),
                max: self.limits.max_file_size,
            });
        }

        Ok(kind)
    }

    /// Validate every file and build submissions for the accepted ones
    ///
    /// Rejected files get no submission and no preview.
    pub fn ingest(&self, files: impl IntoIterator<Item = RawFile>) -> IngestReport {
        let mut report = IngestReport::default();

        for file in files {
            match self.validate(&file) {
                Ok(kind) => report.accepted.push(self.build_submission(file, kind)),
                Err(error) => {
                    debug!(name = %file.name, code = error.code(), "rejected file");
                    report.rejected.push(RejectedFile {
                        name: file.name,
                        error,
                    });
                }
            }
        }

        report
    }

    fn build_submission(&self, file: RawFile, kind: ScanKind) -> PendingSubmission {
        let id = SubmissionId::new();
        let preview = self.reclaimer.allocate(&file.payload, &file.mime_type);
        let now = Utc::now();
        debug!(%id, name = %file.name, %kind, "accepted file");

        PendingSubmission {
            id,
            size: file.size(),
            name: file.name,
            payload: file.payload,
            mime_type: file.mime_type,
            kind,
            preview,
            adjustments: (kind == ScanKind::Image).then(Adjustments::default),
            status: SubmissionStatus::Idle,
            attempts: 0,
            invoice_id: None,
            error: None,
            created_at: now,
            last_updated_at: now,
        }
    }
}

/// Format a byte count for display: `0 Bytes`, `1.5 KB`, `2 MB`
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Guess a MIME type from a file extension
///
/// Unknown extensions map to `application/octet-stream`, which validation
/// then rejects as `INVALID_TYPE`.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return "application/octet-stream";
    };

    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

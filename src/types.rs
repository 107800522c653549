//! Core types for receipt-intake

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier of a pending submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Allocate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of scan, derived from the MIME type at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    /// JPEG or PNG image
    Image,
    /// PDF document
    Pdf,
}

impl ScanKind {
    /// Classify a supported MIME type. Returns `None` for anything else.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/jpeg" | "image/jpg" | "image/png" => Some(Self::Image),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Pdf => write!(f, "pdf"),
        }
    }
}

/// Image-only transform parameters applied before submission
///
/// Tone values are percentages where 100 is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Adjustments {
    /// Clockwise rotation in degrees, always in `0..360`
    pub rotation: u16,
    /// Brightness percentage
    pub brightness: u16,
    /// Contrast percentage
    pub contrast: u16,
    /// Saturation percentage
    pub saturation: u16,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            rotation: 0,
            brightness: 100,
            contrast: 100,
            saturation: 100,
        }
    }
}

/// Lifecycle status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Waiting to be processed
    Idle,
    /// Create-invoice call outstanding
    Creating,
    /// Invoice created (terminal)
    Completed,
    /// Last attempt failed; eligible for a manual retry
    Failed,
}

impl SubmissionStatus {
    /// Whether `process_pending` picks this submission up
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }

    /// Whether the lifecycle graph allows moving from `self` to `next`
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Failed, Self::Creating)
                | (Self::Creating, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Creating => write!(f, "creating"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Host-local reference to a submission's binary data (an object URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    /// Wrap a handle minted by a preview provider
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Handle as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file selected by the user, before validation
#[derive(Debug, Clone)]
pub struct RawFile {
    /// File name as selected
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// File contents
    pub payload: Bytes,
}

impl RawFile {
    /// Create a raw file input
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// One user file pending backend invoice creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmission {
    /// Unique id, immutable
    pub id: SubmissionId,
    /// Display name, editable (extension preserved)
    pub name: String,
    /// File contents
    #[serde(skip)]
    pub payload: Bytes,
    /// MIME type at ingestion
    pub mime_type: String,
    /// Payload size in bytes
    pub size: u64,
    /// Image or PDF
    #[serde(rename = "type")]
    pub kind: ScanKind,
    /// Preview handle, live while the submission is in the store
    pub preview: PreviewHandle,
    /// Present only for images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustments: Option<Adjustments>,
    /// Lifecycle status
    pub status: SubmissionStatus,
    /// Number of processing attempts
    pub attempts: u32,
    /// Set only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    /// Set only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the submission was ingested
    pub created_at: DateTime<Utc>,
    /// Last mutation
    pub last_updated_at: DateTime<Utc>,
}

impl PendingSubmission {
    /// Whether this submission is an image
    pub fn is_image(&self) -> bool {
        self.kind == ScanKind::Image
    }
}

/// Counters accumulated over a store's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Submissions added
    pub total_added: u64,
    /// Submissions that reached `Completed`
    pub total_completed: u64,
    /// Failed attempts
    pub total_failed: u64,
}

/// Immutable view of the store, published to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Submissions in insertion order
    pub submissions: Arc<[Arc<PendingSubmission>]>,
    /// Session counters
    pub session: SessionStats,
    /// Time of the last mutation
    pub last_updated_at: DateTime<Utc>,
}

impl StoreSnapshot {
    /// Number of submissions
    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    /// Look up a submission by id
    pub fn get(&self, id: SubmissionId) -> Option<&Arc<PendingSubmission>> {
        self.submissions.iter().find(|s| s.id == id)
    }

    /// Count submissions in a given status
    pub fn count_by_status(&self, status: SubmissionStatus) -> usize {
        self.submissions.iter().filter(|s| s.status == status).count()
    }

    /// Submissions eligible for processing (idle or failed)
    pub fn pending_count(&self) -> usize {
        self.submissions.iter().filter(|s| s.status.is_pending()).count()
    }
}

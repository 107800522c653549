//! receipt-intake - receipt submission pipeline
//!
//! Validates user-selected receipt scans (JPEG, PNG, PDF), keeps them in a
//! [`store::SubmissionStore`] with host-allocated previews, applies image
//! adjustments, and drives them through an external create-invoice call with
//! per-submission failure handling.
//!
//! ```no_run
//! use receipt_intake::action::HttpInvoiceAction;
//! use receipt_intake::ingest::{FileIngestor, IngestLimits};
//! use receipt_intake::preview::{InMemoryPreviewProvider, ResourceReclaimer};
//! use receipt_intake::process::{NoopProgress, SubmissionProcessor};
//! use receipt_intake::store::SubmissionStore;
//! use receipt_intake::types::RawFile;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> receipt_intake::error::Result<()> {
//! let reclaimer = Arc::new(ResourceReclaimer::new(Arc::new(InMemoryPreviewProvider::new())));
//! let ingestor = FileIngestor::new(IngestLimits::default(), reclaimer.clone());
//! let store = SubmissionStore::new(reclaimer);
//!
//! let report = ingestor.ingest([RawFile::new("receipt.jpg", "image/jpeg", std::fs::read("receipt.jpg")?)]);
//! store.add(report.accepted)?;
//!
//! let action = HttpInvoiceAction::new("https://api.example.com/invoices", None, Duration::from_secs(30))?;
//! SubmissionProcessor::new()
//!     .process_pending(&store, &action, &NoopProgress)
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod adjust;
pub mod config;
pub mod error;
pub mod ingest;
pub mod preview;
pub mod process;
pub mod store;
pub mod types;

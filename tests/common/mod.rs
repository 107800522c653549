//! Common test utilities for receipt-intake tests

pub mod fixtures;
pub mod mock_action;
pub mod recording_preview;

// Re-exports for convenience - not all test binaries use all exports
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_action::{ActionBehavior, MockInvoiceAction, ProgressEvent, RecordingProgress};
#[allow(unused_imports)]
pub use recording_preview::RecordingPreviewProvider;

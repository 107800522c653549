//! Submission processing
//!
//! Moves submissions through the lifecycle:
//! 1. `Idle`/`Failed` submissions are selected and marked `Creating`
//! 2. The create-invoice action runs for each of them concurrently
//! 3. Each result lands on its own submission as `Completed` or `Failed`
//!
//! `Completed` is terminal. `Failed` submissions are retried only when
//! processing is requested again.

mod execute;
mod progress;

pub use execute::{BatchOutcome, BatchReport, SubmissionProcessor};
pub use progress::{NoopProgress, Phase, ProgressCallback};

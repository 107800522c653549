//! Shared CLI progress callback

use crate::cli::style::{Stylize, bar_style, check, cross};
use async_trait::async_trait;
use indicatif::ProgressBar;
use receipt_intake::process::{Phase, ProgressCallback};
use receipt_intake::types::PendingSubmission;

/// CLI progress callback: a progress bar over the batch, one line per
/// finished submission
///
/// When stdout is not a terminal the bar is hidden and lines are printed
/// directly.
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Create progress for a batch of `total` submissions
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(bar_style());
        Self { bar }
    }

    fn line(&self, message: &str) {
        if self.bar.is_hidden() {
            anstream::println!("{message}");
        } else {
            self.bar.println(message);
        }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        match phase {
            Phase::Preparing => {}
            Phase::Creating => self.bar.set_message(phase.to_string()),
            Phase::Complete => self.bar.finish_and_clear(),
        }
    }

    async fn on_submission_started(&self, submission: &PendingSubmission) {
        self.bar.set_message(submission.name.clone());
    }

    async fn on_invoice_created(&self, submission: &PendingSubmission, invoice_id: &str) {
        self.bar.inc(1);
        self.line(&format!(
            "  {} {} {}",
            check(),
            submission.name,
            format!("→ invoice {}", invoice_id.accent()).muted()
        ));
    }

    async fn on_submission_failed(&self, submission: &PendingSubmission, message: &str) {
        self.bar.inc(1);
        self.line(&format!(
            "  {} {}: {}",
            cross(),
            submission.name,
            message.failure()
        ));
    }

    async fn on_message(&self, message: &str) {
        self.line(message);
    }
}

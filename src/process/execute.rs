//! Batch execution: drive pending submissions through the create-invoice
//! action

use crate::action::{CreateInvoiceAction, CreateInvoiceResponse};
use crate::error::Error;
use crate::process::progress::{Phase, ProgressCallback};
use crate::store::{StatusExtra, SubmissionStore};
use crate::types::{PendingSubmission, SubmissionId, SubmissionStatus};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// What a call to [`SubmissionProcessor::process_pending`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No idle or failed submissions; nothing changed
    NothingToProcess,
    /// Another batch was still running; nothing changed
    AlreadyInFlight,
    /// A batch ran to completion
    Processed(BatchReport),
}

impl BatchOutcome {
    /// Report of the batch, if one ran
    pub const fn report(&self) -> Option<&BatchReport> {
        match self {
            Self::Processed(report) => Some(report),
            Self::NothingToProcess | Self::AlreadyInFlight => None,
        }
    }
}

/// Per-submission results of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Submissions that reached `Completed`, with their invoice ids
    pub completed: Vec<(SubmissionId, String)>,
    /// Submissions that ended `Failed`, with the failure message
    pub failed: Vec<(SubmissionId, String)>,
    /// Submissions removed from the store while their call was outstanding
    pub discarded: Vec<SubmissionId>,
}

impl BatchReport {
    /// Whether every submission in the batch completed
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of submissions the batch started with
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len() + self.discarded.len()
    }
}

enum ItemOutcome {
    Completed(SubmissionId, String),
    Failed(SubmissionId, String),
    Discarded(SubmissionId),
}

/// Runs batches of pending submissions, one batch at a time
#[derive(Debug, Default)]
pub struct SubmissionProcessor {
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

const CANCELLED_MESSAGE: &str = "Cancelled before the invoice was created";

/// Fails batch members still marked `Creating` if the batch future is
/// dropped before every call resolved, so they stay retryable
struct CancelGuard<'a> {
    store: &'a SubmissionStore,
    ids: Vec<SubmissionId>,
    armed: bool,
}

impl<'a> CancelGuard<'a> {
    const fn new(store: &'a SubmissionStore, ids: Vec<SubmissionId>) -> Self {
        Self {
            store,
            ids,
            armed: true,
        }
    }

    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for &id in &self.ids {
            let still_creating = self
                .store
                .get(id)
                .is_some_and(|s| s.status == SubmissionStatus::Creating);
            if still_creating {
                warn!(%id, "batch cancelled, failing submission");
                let _ = self.store.update_status(
                    id,
                    SubmissionStatus::Failed,
                    StatusExtra::error(CANCELLED_MESSAGE),
                );
            }
        }
    }
}

impl SubmissionProcessor {
    /// Create an idle processor
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a batch is currently running
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Process every idle or failed submission in `store`
    ///
    /// All eligible submissions are marked `Creating` up front, then the
    /// action is called for each of them concurrently. A failing call only
    /// fails its own submission. Never returns an error: failures are
    /// recorded on the submissions themselves.
    ///
    /// Dropping the returned future before it completes fails every
    /// submission whose call had not resolved yet.
    pub async fn process_pending(
        &self,
        store: &SubmissionStore,
        action: &dyn CreateInvoiceAction,
        progress: &dyn ProgressCallback,
    ) -> BatchOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            info!("batch already in flight, ignoring request");
            progress.on_message("A batch is already being processed").await;
            return BatchOutcome::AlreadyInFlight;
        };

        progress.on_phase(Phase::Preparing).await;
        let candidates = store.pending();
        if candidates.is_empty() {
            info!("nothing to process");
            progress.on_message("No files to process").await;
            return BatchOutcome::NothingToProcess;
        }

        let batch: Vec<Arc<PendingSubmission>> = candidates
            .iter()
            .filter_map(|candidate| {
                store
                    .update_status(candidate.id, SubmissionStatus::Creating, StatusExtra::default())
                    .inspect_err(|e| debug!(id = %candidate.id, error = %e, "skipping submission"))
                    .ok()
            })
            .collect();

        let mut cancel = CancelGuard::new(store, batch.iter().map(|s| s.id).collect());

        info!(count = batch.len(), "processing batch");
        progress.on_phase(Phase::Creating).await;

        let outcomes = join_all(
            batch
                .iter()
                .map(|submission| process_one(store, action, progress, submission)),
        )
        .await;
        cancel.disarm();

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Completed(id, invoice_id) => report.completed.push((id, invoice_id)),
                ItemOutcome::Failed(id, message) => report.failed.push((id, message)),
                ItemOutcome::Discarded(id) => report.discarded.push(id),
            }
        }

        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            discarded = report.discarded.len(),
            "batch finished"
        );
        progress.on_phase(Phase::Complete).await;

        BatchOutcome::Processed(report)
    }
}

async fn process_one(
    store: &SubmissionStore,
    action: &dyn CreateInvoiceAction,
    progress: &dyn ProgressCallback,
    submission: &PendingSubmission,
) -> ItemOutcome {
    let id = submission.id;
    progress.on_submission_started(submission).await;

    let (status, extra) = match action.create_invoice(submission).await {
        Ok(CreateInvoiceResponse::Created { invoice_id }) if !invoice_id.trim().is_empty() => {
            (SubmissionStatus::Completed, StatusExtra::invoice(invoice_id))
        }
        Ok(CreateInvoiceResponse::Created { .. }) => (
            SubmissionStatus::Failed,
            StatusExtra::error("backend returned an empty invoice id"),
        ),
        Ok(CreateInvoiceResponse::Rejected { code, message }) => {
            debug!(%id, %code, "backend rejected submission");
            (SubmissionStatus::Failed, StatusExtra::error(message))
        }
        Err(e) => (SubmissionStatus::Failed, StatusExtra::error(e.to_string())),
    };

    // The submission may have been removed while the call was outstanding;
    // update_status only applies to current members.
    let updated = match store.update_status(id, status, extra) {
        Ok(updated) => updated,
        Err(Error::SubmissionNotFound(_)) => {
            debug!(%id, "submission removed while in flight, discarding result");
            return ItemOutcome::Discarded(id);
        }
        Err(e) => {
            warn!(%id, error = %e, "could not record result, discarding");
            return ItemOutcome::Discarded(id);
        }
    };

    match (&updated.invoice_id, &updated.error) {
        (Some(invoice_id), _) => {
            progress.on_invoice_created(&updated, invoice_id).await;
            ItemOutcome::Completed(id, invoice_id.clone())
        }
        (None, message) => {
            let message = message.clone().unwrap_or_default();
            warn!(%id, name = %updated.name, error = %message, "submission failed");
            progress.on_submission_failed(&updated, &message).await;
            ItemOutcome::Failed(id, message)
        }
    }
}

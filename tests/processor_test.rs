//! Submission processor tests

mod common;

use common::{
    ActionBehavior, MockInvoiceAction, Pipeline, ProgressEvent, RecordingProgress, jpeg, pdf, png,
};
use receipt_intake::process::{BatchOutcome, NoopProgress, Phase, SubmissionProcessor};
use receipt_intake::types::SubmissionStatus;
use std::sync::Arc;

#[tokio::test]
async fn test_all_succeed() {
    let pipeline = Pipeline::new();
    let ids = pipeline.load(vec![jpeg("a.jpg", 8), pdf("b.pdf", 8)]);
    let action = MockInvoiceAction::creating();

    let outcome = SubmissionProcessor::new()
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;

    let report = outcome.report().unwrap();
    assert!(report.success());
    assert_eq!(report.completed.len(), 2);
    assert!(report.failed.is_empty());

    let a = pipeline.store.get(ids[0]).unwrap();
    assert_eq!(a.status, SubmissionStatus::Completed);
    assert_eq!(a.invoice_id.as_deref(), Some("inv-a.jpg"));
    assert_eq!(a.attempts, 1);
    assert!(a.error.is_none());

    let b = pipeline.store.get(ids[1]).unwrap();
    assert_eq!(b.invoice_id.as_deref(), Some("inv-b.pdf"));
}

#[tokio::test]
async fn test_all_fail() {
    let pipeline = Pipeline::new();
    let ids = pipeline.load(vec![jpeg("a.jpg", 8), png("b.png", 8)]);
    let action = MockInvoiceAction::throwing("boom");

    let outcome = SubmissionProcessor::new()
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;

    let report = outcome.report().unwrap();
    assert!(!report.success());
    assert_eq!(report.failed.len(), 2);
    for id in ids {
        let submission = pipeline.store.get(id).unwrap();
        assert_eq!(submission.status, SubmissionStatus::Failed);
        assert_eq!(submission.error.as_deref(), Some("boom"));
        assert!(submission.invoice_id.is_none());
    }
}

#[tokio::test]
async fn test_rejected_response_fails_with_message() {
    let pipeline = Pipeline::new();
    let id = pipeline.load(vec![jpeg("a.jpg", 8)])[0];
    let action = MockInvoiceAction::new(ActionBehavior::Reject {
        code: "UNREADABLE".to_string(),
        message: "Could not read the receipt".to_string(),
    });

    SubmissionProcessor::new()
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;

    let submission = pipeline.store.get(id).unwrap();
    assert_eq!(submission.status, SubmissionStatus::Failed);
    assert_eq!(
        submission.error.as_deref(),
        Some("Could not read the receipt")
    );
}

#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let pipeline = Pipeline::new();
    let ids = pipeline.load(vec![jpeg("a.jpg", 8), jpeg("bad.jpg", 8), pdf("c.pdf", 8)]);
    let action = MockInvoiceAction::failing_names(&["bad.jpg"]);

    let outcome = SubmissionProcessor::new()
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;

    let report = outcome.report().unwrap();
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failed, vec![(ids[1], "boom".to_string())]);
    assert_eq!(report.total(), 3);

    let statuses: Vec<SubmissionStatus> = ids
        .iter()
        .map(|id| pipeline.store.get(*id).unwrap().status)
        .collect();
    assert_eq!(
        statuses,
        [
            SubmissionStatus::Completed,
            SubmissionStatus::Failed,
            SubmissionStatus::Completed
        ]
    );
}

#[tokio::test]
async fn test_retry_picks_up_failed_only() {
    let pipeline = Pipeline::new();
    let ids = pipeline.load(vec![jpeg("a.jpg", 8), jpeg("bad.jpg", 8)]);
    let processor = SubmissionProcessor::new();
    let action = MockInvoiceAction::failing_names(&["bad.jpg"]);

    processor
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;
    assert_eq!(action.call_count(), 2);

    action.set_behavior(ActionBehavior::Create);
    let outcome = processor
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;

    // only the failed one is sent again
    assert_eq!(action.call_count(), 3);
    assert_eq!(action.calls()[2], ids[1]);
    assert_eq!(outcome.report().unwrap().completed.len(), 1);

    let retried = pipeline.store.get(ids[1]).unwrap();
    assert_eq!(retried.status, SubmissionStatus::Completed);
    assert_eq!(retried.attempts, 2);
    assert!(retried.error.is_none());
    assert_eq!(retried.invoice_id.as_deref(), Some("inv-bad.jpg"));

    assert_eq!(pipeline.store.get(ids[0]).unwrap().attempts, 1);
}

#[tokio::test]
async fn test_nothing_to_process() {
    let pipeline = Pipeline::new();
    let processor = SubmissionProcessor::new();
    let action = MockInvoiceAction::creating();

    let outcome = processor
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;
    assert_eq!(outcome, BatchOutcome::NothingToProcess);

    pipeline.load(vec![jpeg("a.jpg", 8)]);
    processor
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;

    // everything completed, so a second run changes nothing
    let before = pipeline.store.snapshot();
    let outcome = processor
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;
    assert_eq!(outcome, BatchOutcome::NothingToProcess);
    assert_eq!(action.call_count(), 1);
    assert!(Arc::ptr_eq(&before, &pipeline.store.snapshot()));
    assert!(!processor.is_processing());
}

#[tokio::test]
async fn test_calls_run_concurrently() {
    let pipeline = Pipeline::new();
    pipeline.load((0..5).map(|i| jpeg(&format!("{i}.jpg"), 8)).collect());
    let action = MockInvoiceAction::creating();

    SubmissionProcessor::new()
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;

    assert_eq!(action.call_count(), 5);
    assert_eq!(action.max_in_flight(), 5);
}

#[tokio::test]
async fn test_progress_events() {
    let pipeline = Pipeline::new();
    pipeline.load(vec![jpeg("a.jpg", 8), jpeg("bad.jpg", 8)]);
    let action = MockInvoiceAction::failing_names(&["bad.jpg"]);
    let progress = RecordingProgress::new();

    SubmissionProcessor::new()
        .process_pending(&pipeline.store, &action, &progress)
        .await;

    assert_eq!(
        progress.phases(),
        [Phase::Preparing, Phase::Creating, Phase::Complete]
    );
    let events = progress.events();
    assert!(events.contains(&ProgressEvent::Started("a.jpg".to_string())));
    assert!(events.contains(&ProgressEvent::Created(
        "a.jpg".to_string(),
        "inv-a.jpg".to_string()
    )));
    assert!(events.contains(&ProgressEvent::Failed(
        "bad.jpg".to_string(),
        "boom".to_string()
    )));
}

#[tokio::test]
async fn test_session_stats_follow_results() {
    let pipeline = Pipeline::new();
    pipeline.load(vec![jpeg("a.jpg", 8), jpeg("bad.jpg", 8), pdf("c.pdf", 8)]);
    let action = MockInvoiceAction::failing_names(&["bad.jpg"]);

    SubmissionProcessor::new()
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;

    let snapshot = pipeline.store.snapshot();
    assert_eq!(snapshot.session.total_added, 3);
    assert_eq!(snapshot.session.total_completed, 2);
    assert_eq!(snapshot.session.total_failed, 1);
    assert_eq!(snapshot.count_by_status(SubmissionStatus::Failed), 1);
    assert_eq!(snapshot.pending_count(), 1);
}

#[tokio::test]
async fn test_processed_store_still_reclaims() {
    let pipeline = Pipeline::new();
    pipeline.load(vec![jpeg("a.jpg", 8), pdf("b.pdf", 8)]);
    let action = MockInvoiceAction::creating();

    SubmissionProcessor::new()
        .process_pending(&pipeline.store, &action, &NoopProgress)
        .await;
    pipeline.store.clear_all();

    assert!(pipeline.provider.all_revoked_once());
}

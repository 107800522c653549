//! Mock create-invoice action and recording progress callback

use async_trait::async_trait;
use receipt_intake::action::{CreateInvoiceAction, CreateInvoiceResponse};
use receipt_intake::error::{Error, Result};
use receipt_intake::process::{Phase, ProgressCallback};
use receipt_intake::types::{PendingSubmission, SubmissionId};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How the mock answers
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum ActionBehavior {
    /// Every call returns `inv-<file name>`
    Create,
    /// Every call returns an error with this message
    Throw(String),
    /// Every call returns an error-shaped response
    Reject { code: String, message: String },
    /// Calls for these file names throw "boom", the rest succeed
    FailNames(HashSet<String>),
}

/// Scripted [`CreateInvoiceAction`] that records calls and concurrency
pub struct MockInvoiceAction {
    behavior: Mutex<ActionBehavior>,
    calls: Mutex<Vec<SubmissionId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl MockInvoiceAction {
    pub fn new(behavior: ActionBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn creating() -> Self {
        Self::new(ActionBehavior::Create)
    }

    pub fn throwing(message: &str) -> Self {
        Self::new(ActionBehavior::Throw(message.to_string()))
    }

    pub fn failing_names(names: &[&str]) -> Self {
        Self::new(ActionBehavior::FailNames(
            names.iter().map(ToString::to_string).collect(),
        ))
    }

    /// Change behavior between batches
    pub fn set_behavior(&self, behavior: ActionBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<SubmissionId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of calls outstanding at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreateInvoiceAction for MockInvoiceAction {
    async fn create_invoice(&self, submission: &PendingSubmission) -> Result<CreateInvoiceResponse> {
        self.calls.lock().unwrap().push(submission.id);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Give sibling calls a chance to start before this one resolves
        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            ActionBehavior::Create => Ok(CreateInvoiceResponse::created(format!(
                "inv-{}",
                submission.name
            ))),
            ActionBehavior::Throw(message) => Err(Error::Action(message)),
            ActionBehavior::Reject { code, message } => {
                Ok(CreateInvoiceResponse::rejected(code, message))
            }
            ActionBehavior::FailNames(names) => {
                if names.contains(&submission.name) {
                    Err(Error::Action("boom".to_string()))
                } else {
                    Ok(CreateInvoiceResponse::created(format!(
                        "inv-{}",
                        submission.name
                    )))
                }
            }
        }
    }
}

/// Progress event, as recorded by [`RecordingProgress`]
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Phase(Phase),
    Started(String),
    Created(String, String),
    Failed(String, String),
    Message(String),
}

/// Progress callback that keeps every event
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

#[allow(dead_code)]
impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Phase(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_phase(&self, phase: Phase) {
        self.push(ProgressEvent::Phase(phase));
    }

    async fn on_submission_started(&self, submission: &PendingSubmission) {
        self.push(ProgressEvent::Started(submission.name.clone()));
    }

    async fn on_invoice_created(&self, submission: &PendingSubmission, invoice_id: &str) {
        self.push(ProgressEvent::Created(
            submission.name.clone(),
            invoice_id.to_string(),
        ));
    }

    async fn on_submission_failed(&self, submission: &PendingSubmission, message: &str) {
        self.push(ProgressEvent::Failed(
            submission.name.clone(),
            message.to_string(),
        ));
    }

    async fn on_message(&self, message: &str) {
        self.push(ProgressEvent::Message(message.to_string()));
    }
}

//! Submission store
//!
//! The single owner of mutable submission state. Every mutation replaces
//! whole records (`Arc<PendingSubmission>`) under a short synchronous lock,
//! then publishes a fresh [`StoreSnapshot`] to subscribers. Removal paths
//! revoke previews before the removal is published.

use crate::adjust;
use crate::error::{Error, Result};
use crate::preview::ResourceReclaimer;
use crate::types::{
    Adjustments, PendingSubmission, PreviewHandle, SessionStats, StoreSnapshot, SubmissionId,
    SubmissionStatus,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::debug;

/// Fields merged into a submission together with a status change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusExtra {
    /// Invoice created by the backend (required for `Completed`)
    pub invoice_id: Option<String>,
    /// Failure message (used for `Failed`)
    pub error: Option<String>,
}

impl StatusExtra {
    /// Extra fields for a completed submission
    pub fn invoice(invoice_id: impl Into<String>) -> Self {
        Self {
            invoice_id: Some(invoice_id.into()),
            error: None,
        }
    }

    /// Extra fields for a failed submission
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            invoice_id: None,
            error: Some(message.into()),
        }
    }
}

struct StoreState {
    submissions: Vec<Arc<PendingSubmission>>,
    session: SessionStats,
    last_updated_at: DateTime<Utc>,
}

impl StoreState {
    fn position(&self, id: SubmissionId) -> Result<usize> {
        self.submissions
            .iter()
            .position(|s| s.id == id)
            .ok_or(Error::SubmissionNotFound(id))
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            submissions: self.submissions.iter().cloned().collect(),
            session: self.session,
            last_updated_at: self.last_updated_at,
        }
    }
}

/// Ordered, keyed collection of pending submissions
pub struct SubmissionStore {
    state: Mutex<StoreState>,
    reclaimer: Arc<ResourceReclaimer>,
    notify: watch::Sender<Arc<StoreSnapshot>>,
}

impl SubmissionStore {
    /// Create an empty store revoking previews through `reclaimer`
    pub fn new(reclaimer: Arc<ResourceReclaimer>) -> Self {
        let state = StoreState {
            submissions: Vec::new(),
            session: SessionStats::default(),
            last_updated_at: Utc::now(),
        };
        let (notify, _) = watch::channel(Arc::new(state.snapshot()));
        Self {
            state: Mutex::new(state),
            reclaimer,
            notify,
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.notify.borrow().clone()
    }

    /// Receive a new snapshot after every mutation
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.notify.subscribe()
    }

    /// Current record for `id`
    pub fn get(&self, id: SubmissionId) -> Option<Arc<PendingSubmission>> {
        self.lock().submissions.iter().find(|s| s.id == id).cloned()
    }

    /// Submissions eligible for processing (idle or failed), in order
    pub fn pending(&self) -> Vec<Arc<PendingSubmission>> {
        self.lock()
            .submissions
            .iter()
            .filter(|s| s.status.is_pending())
            .cloned()
            .collect()
    }

    /// Append submissions
    ///
    /// The batch is all-or-nothing: if any id is already present (or
    /// repeated within the batch) nothing is added. The dropped batch's
    /// previews are revoked, except those still held by stored records.
    pub fn add(&self, submissions: Vec<PendingSubmission>) -> Result<usize> {
        let count = submissions.len();
        self.mutate(|state| {
            let mut seen: HashSet<SubmissionId> =
                state.submissions.iter().map(|s| s.id).collect();
            if let Some(dup) = submissions.iter().find(|s| !seen.insert(s.id)) {
                let mut held: HashSet<&PreviewHandle> =
                    state.submissions.iter().map(|s| &s.preview).collect();
                for submission in &submissions {
                    if held.insert(&submission.preview) {
                        self.reclaimer.revoke(submission);
                    }
                }
                return Err(Error::DuplicateSubmission(dup.id));
            }
            state.submissions.extend(submissions.into_iter().map(Arc::new));
            state.session.total_added += count as u64;
            Ok(())
        })?;
        debug!(count, "added submissions");
        Ok(count)
    }

    /// Remove one submission, revoking its preview
    pub fn remove_by_id(&self, id: SubmissionId) -> Result<Arc<PendingSubmission>> {
        let removed = self.mutate(|state| {
            let idx = state.position(id)?;
            let removed = state.submissions.remove(idx);
            self.reclaimer.revoke(&removed);
            Ok(removed)
        })?;
        debug!(%id, "removed submission");
        Ok(removed)
    }

    /// Remove every listed submission, revoking each preview
    ///
    /// Unknown ids are ignored. Returns the number removed.
    pub fn remove_by_ids(&self, ids: &[SubmissionId]) -> usize {
        let ids: HashSet<SubmissionId> = ids.iter().copied().collect();
        let removed = self.remove_where(|s| ids.contains(&s.id));
        debug!(removed, "removed submissions");
        removed
    }

    /// Remove everything, revoking every preview
    pub fn clear_all(&self) -> usize {
        let removed = self.remove_where(|_| true);
        debug!(removed, "cleared store");
        removed
    }

    /// Remove completed submissions, revoking their previews
    pub fn prune_completed(&self) -> usize {
        let removed = self.remove_where(|s| s.status == SubmissionStatus::Completed);
        debug!(removed, "pruned completed submissions");
        removed
    }

    fn remove_where(&self, predicate: impl Fn(&PendingSubmission) -> bool) -> usize {
        self.mutate(|state| {
            let (removed, kept): (Vec<_>, Vec<_>) = state
                .submissions
                .drain(..)
                .partition(|s| predicate(&**s));
            state.submissions = kept;
            for submission in &removed {
                self.reclaimer.revoke(submission);
            }
            Ok(removed.len())
        })
        .unwrap_or_default()
    }

    /// Rename a submission, keeping the original file extension
    pub fn rename_by_id(&self, id: SubmissionId, new_name: &str) -> Result<()> {
        self.replace(id, |current| {
            let name = preserve_extension(&current.name, new_name)?;
            debug!(%id, from = %current.name, to = %name, "renamed submission");
            Ok(PendingSubmission {
                name,
                last_updated_at: Utc::now(),
                ..current.clone()
            })
        })
        .map(|_| ())
    }

    /// Change a submission's status, merging `extra` in the same write
    ///
    /// Only moves allowed by the lifecycle graph are accepted. Entering
    /// `Creating` counts an attempt and clears the previous error.
    pub fn update_status(
        &self,
        id: SubmissionId,
        status: SubmissionStatus,
        extra: StatusExtra,
    ) -> Result<Arc<PendingSubmission>> {
        let updated = self.mutate(|state| {
            let idx = state.position(id)?;
            let current = &state.submissions[idx];

            if !current.status.can_transition_to(status) {
                return Err(Error::InvalidTransition {
                    id,
                    from: current.status,
                    to: status,
                });
            }

            let mut next = PendingSubmission::clone(current);
            next.status = status;
            next.last_updated_at = Utc::now();

            match status {
                SubmissionStatus::Creating => {
                    next.attempts += 1;
                    next.error = None;
                    next.invoice_id = None;
                }
                SubmissionStatus::Completed => {
                    let invoice_id = extra.invoice_id.ok_or_else(|| {
                        Error::InvalidArgument(format!(
                            "completing {id} requires an invoice id"
                        ))
                    })?;
                    next.invoice_id = Some(invoice_id);
                    next.error = None;
                    state.session.total_completed += 1;
                }
                SubmissionStatus::Failed => {
                    next.error = Some(extra.error.unwrap_or_else(|| "Unknown error".to_string()));
                    next.invoice_id = None;
                    state.session.total_failed += 1;
                }
                SubmissionStatus::Idle => {}
            }

            let next = Arc::new(next);
            state.submissions[idx] = Arc::clone(&next);
            Ok(next)
        })?;
        debug!(%id, %status, attempts = updated.attempts, "updated status");
        Ok(updated)
    }

    /// Rotate an image submission by `degrees`
    pub fn rotate(&self, id: SubmissionId, degrees: i32) -> Result<()> {
        self.mutate(|state| {
            let idx = state.position(id)?;
            let target = &state.submissions[idx];
            if !target.is_image() {
                return Err(Error::RotationUnsupported(format!(
                    "{} is a {}",
                    target.name, target.kind
                )));
            }
            state.submissions = adjust::rotate(&state.submissions, id, degrees);
            Ok(())
        })?;
        debug!(%id, degrees, "rotated submission");
        Ok(())
    }

    /// Replace the tone and rotation adjustments of an image submission
    pub fn set_adjustments(&self, id: SubmissionId, adjustments: Adjustments) -> Result<()> {
        adjustments.validate()?;
        self.mutate(|state| {
            let idx = state.position(id)?;
            let target = &state.submissions[idx];
            if !target.is_image() {
                return Err(Error::InvalidAdjustment(format!(
                    "{} is a {} and has no adjustments",
                    target.name, target.kind
                )));
            }
            state.submissions = adjust::with_adjustments(&state.submissions, id, adjustments);
            Ok(())
        })
    }

    /// Install a superseding payload, e.g. a re-encoded rotated image
    ///
    /// A preview for the new payload is allocated and the previous one is
    /// revoked once the new record is in place.
    pub fn replace_payload(&self, id: SubmissionId, payload: Bytes) -> Result<()> {
        self.install_payload(id, payload, None).map(|_| ())
    }

    /// Rotate the pixels of an image submission by a multiple of 90 degrees
    ///
    /// The re-encoded image supersedes the stored payload through
    /// [`replace_payload`](Self::replace_payload); rotation metadata is left
    /// as it is since the payload itself is now upright.
    pub fn rotate_payload(&self, id: SubmissionId, degrees: i32) -> Result<Arc<PendingSubmission>> {
        let current = self.get(id).ok_or(Error::SubmissionNotFound(id))?;
        if !current.is_image() {
            return Err(Error::RotationUnsupported(format!(
                "{} is a {}",
                current.name, current.kind
            )));
        }

        let rotated = adjust::rotate_image(&current.payload, &current.mime_type, degrees)?;
        let updated = self.install_payload(id, rotated, Some(&current.preview))?;
        debug!(%id, degrees, size = updated.size, "rotated payload");
        Ok(updated)
    }

    /// Put a previously removed submission back, e.g. to undo a delete
    ///
    /// A fresh preview is allocated, since the old one was revoked on
    /// removal. The submission is inserted before the first stored record
    /// created after it, or appended.
    pub fn restore(&self, submission: &PendingSubmission) -> Result<Arc<PendingSubmission>> {
        let id = submission.id;
        let restored = self.mutate(|state| {
            if state.submissions.iter().any(|s| s.id == id) {
                return Err(Error::DuplicateSubmission(id));
            }
            let preview = self
                .reclaimer
                .allocate(&submission.payload, &submission.mime_type);
            let restored = Arc::new(PendingSubmission {
                preview,
                last_updated_at: Utc::now(),
                ..submission.clone()
            });
            let idx = state
                .submissions
                .iter()
                .position(|s| s.created_at > submission.created_at)
                .unwrap_or(state.submissions.len());
            state.submissions.insert(idx, Arc::clone(&restored));
            Ok(restored)
        })?;
        debug!(%id, "restored submission");
        Ok(restored)
    }

    fn install_payload(
        &self,
        id: SubmissionId,
        payload: Bytes,
        expected_preview: Option<&PreviewHandle>,
    ) -> Result<Arc<PendingSubmission>> {
        let updated = self.mutate(|state| {
            let idx = state.position(id)?;
            let current = Arc::clone(&state.submissions[idx]);
            if expected_preview.is_some_and(|expected| *expected != current.preview) {
                return Err(Error::InvalidArgument(format!(
                    "payload of {id} changed while it was being replaced"
                )));
            }
            let preview = self.reclaimer.allocate(&payload, &current.mime_type);
            let next = Arc::new(PendingSubmission {
                size: payload.len() as u64,
                payload,
                preview,
                last_updated_at: Utc::now(),
                ..PendingSubmission::clone(&current)
            });
            state.submissions[idx] = Arc::clone(&next);
            self.reclaimer.revoke(&current);
            Ok(next)
        })?;
        debug!(%id, "replaced payload");
        Ok(updated)
    }

    /// Zero the session counters
    pub fn reset_session_stats(&self) {
        let _ = self.mutate(|state| {
            state.session = SessionStats::default();
            Ok(())
        });
    }

    fn replace(
        &self,
        id: SubmissionId,
        f: impl FnOnce(&PendingSubmission) -> Result<PendingSubmission>,
    ) -> Result<Arc<PendingSubmission>> {
        self.mutate(|state| {
            let idx = state.position(id)?;
            let next = Arc::new(f(&state.submissions[idx])?);
            state.submissions[idx] = Arc::clone(&next);
            Ok(next)
        })
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let mut state = self.lock();
        let value = f(&mut state)?;
        state.last_updated_at = Utc::now();
        // Published under the state lock so snapshots go out in mutation order
        self.notify.send_replace(Arc::new(state.snapshot()));
        Ok(value)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SubmissionStore {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for submission in state.submissions.drain(..) {
            self.reclaimer.revoke(&submission);
        }
    }
}

impl std::fmt::Debug for SubmissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SubmissionStore")
            .field("submissions", &state.submissions.len())
            .field("session", &state.session)
            .finish_non_exhaustive()
    }
}

/// Apply a new display name while keeping the extension of `original`
///
/// `"receipt.jpg"` renamed to `"march"` or `"march.JPG"` becomes
/// `"march.jpg"`. Names without an extension are taken as given.
pub fn preserve_extension(original: &str, new_name: &str) -> Result<String> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(Error::InvalidName("name cannot be empty".to_string()));
    }

    let Some(ext) = extension(original) else {
        return Ok(new_name.to_string());
    };

    let dotted = format!(".{ext}");
    let stem = match new_name.len().checked_sub(dotted.len()) {
        Some(split)
            if new_name.is_char_boundary(split) && new_name[split..].eq_ignore_ascii_case(&dotted) =>
        {
            &new_name[..split]
        }
        _ => new_name,
    };
    if stem.is_empty() {
        return Err(Error::InvalidName(format!("'{new_name}' has no name before the extension")));
    }

    Ok(format!("{stem}.{ext}"))
}

fn extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}

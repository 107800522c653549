//! Preview reclamation

use crate::preview::PreviewProvider;
use crate::types::{PendingSubmission, PreviewHandle};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Allocates previews for submissions and revokes them on removal or
/// supersession
///
/// Shared between the ingestor (allocation) and the store (revocation).
/// Once the store is cleared, `allocated() == revoked()`.
pub struct ResourceReclaimer {
    provider: Arc<dyn PreviewProvider>,
    allocated: AtomicU64,
    revoked: AtomicU64,
}

impl ResourceReclaimer {
    /// Wrap a host preview provider
    pub fn new(provider: Arc<dyn PreviewProvider>) -> Self {
        Self {
            provider,
            allocated: AtomicU64::new(0),
            revoked: AtomicU64::new(0),
        }
    }

    /// Allocate a preview for a payload
    pub fn allocate(&self, payload: &Bytes, mime_type: &str) -> PreviewHandle {
        let handle = self.provider.allocate(payload, mime_type);
        self.allocated.fetch_add(1, Ordering::Relaxed);
        handle
    }

    /// Release a submission's preview
    ///
    /// Callers must only pass submissions that have just left the store,
    /// so each handle reaches this exactly once.
    pub fn revoke(&self, submission: &PendingSubmission) {
        self.revoke_handle(&submission.preview);
        debug!(id = %submission.id, handle = %submission.preview, "revoked preview");
    }

    /// Release a handle that was superseded while its submission stays live
    pub(crate) fn revoke_handle(&self, handle: &PreviewHandle) {
        self.provider.revoke(handle);
        self.revoked.fetch_add(1, Ordering::Relaxed);
    }

    /// Total handles allocated
    pub fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Total handles revoked
    pub fn revoked(&self) -> u64 {
        self.revoked.load(Ordering::Relaxed)
    }

    /// Handles allocated but not yet revoked
    pub fn outstanding(&self) -> u64 {
        self.allocated().saturating_sub(self.revoked())
    }
}

impl std::fmt::Debug for ResourceReclaimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceReclaimer")
            .field("allocated", &self.allocated())
            .field("revoked", &self.revoked())
            .finish_non_exhaustive()
    }
}

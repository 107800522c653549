//! In-process preview provider

use crate::preview::PreviewProvider;
use crate::types::PreviewHandle;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Preview provider that tracks live `blob:` handles in memory
///
/// Used by the CLI host and in tests, where there is no browser to mint
/// object URLs.
#[derive(Debug, Default)]
pub struct InMemoryPreviewProvider {
    live: Mutex<HashSet<PreviewHandle>>,
}

impl InMemoryPreviewProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a handle is allocated and not yet revoked
    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(handle)
    }

    /// Number of handles currently allocated
    pub fn live_count(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PreviewProvider for InMemoryPreviewProvider {
    fn allocate(&self, payload: &Bytes, mime_type: &str) -> PreviewHandle {
        let handle = PreviewHandle::new(format!("blob:intake/{}", Uuid::new_v4()));
        debug!(handle = %handle, mime_type, size = payload.len(), "allocated preview");
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.clone());
        handle
    }

    fn revoke(&self, handle: &PreviewHandle) {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle);
        if !removed {
            warn!(handle = %handle, "revoking unknown preview handle");
        }
    }
}

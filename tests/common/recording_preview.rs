//! Preview provider that records every allocation and revocation

use bytes::Bytes;
use receipt_intake::preview::PreviewProvider;
use receipt_intake::types::PreviewHandle;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Ledger {
    next: u64,
    allocated: Vec<PreviewHandle>,
    revocations: HashMap<PreviewHandle, u32>,
}

/// Hands out `blob:test/<n>` handles and counts revocations per handle
#[derive(Default)]
pub struct RecordingPreviewProvider {
    ledger: Mutex<Ledger>,
}

#[allow(dead_code)]
impl RecordingPreviewProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocations(&self) -> usize {
        self.ledger.lock().unwrap().allocated.len()
    }

    pub fn revocations(&self) -> u32 {
        self.ledger.lock().unwrap().revocations.values().sum()
    }

    /// How many times a handle was revoked
    pub fn revoke_count(&self, handle: &PreviewHandle) -> u32 {
        self.ledger
            .lock()
            .unwrap()
            .revocations
            .get(handle)
            .copied()
            .unwrap_or(0)
    }

    /// Every allocated handle was revoked exactly once
    pub fn all_revoked_once(&self) -> bool {
        let ledger = self.ledger.lock().unwrap();
        ledger.allocated.len() == ledger.revocations.len()
            && ledger
                .allocated
                .iter()
                .all(|h| ledger.revocations.get(h) == Some(&1))
    }
}

impl PreviewProvider for RecordingPreviewProvider {
    fn allocate(&self, _payload: &Bytes, _mime_type: &str) -> PreviewHandle {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.next += 1;
        let handle = PreviewHandle::new(format!("blob:test/{}", ledger.next));
        ledger.allocated.push(handle.clone());
        handle
    }

    fn revoke(&self, handle: &PreviewHandle) {
        *self
            .ledger
            .lock()
            .unwrap()
            .revocations
            .entry(handle.clone())
            .or_insert(0) += 1;
    }
}

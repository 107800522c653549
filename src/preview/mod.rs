//! Preview handles for submissions
//!
//! The host runtime owns the actual handles (object URLs in a browser);
//! this module only requires the allocate/revoke pair and keeps the
//! bookkeeping that proves every allocation is eventually revoked.

mod memory;
mod reclaim;

pub use memory::InMemoryPreviewProvider;
pub use reclaim::ResourceReclaimer;

use crate::types::PreviewHandle;
use bytes::Bytes;

/// Host-provided preview handle allocator
///
/// Implementations must treat each handle as single-use: a handle passed to
/// [`revoke`] is never used again.
///
/// [`revoke`]: Self::revoke
pub trait PreviewProvider: Send + Sync {
    /// Allocate a handle referencing `payload`
    fn allocate(&self, payload: &Bytes, mime_type: &str) -> PreviewHandle;

    /// Release a handle previously returned by [`allocate`]
    ///
    /// [`allocate`]: Self::allocate
    fn revoke(&self, handle: &PreviewHandle);
}

use std::sync::{Arc, RwLock};

use crate::retrieval::index::VectorIndex;

/// Single slot holding the currently active index, shared across request
/// handlers.
///
/// `set` swaps the whole `Arc` under a write lock, so a concurrent `get`
/// either sees the previous fully-built index or the new one, never a
/// partial state. A failed ingestion simply never calls `set`, leaving the
/// prior index intact.
#[derive(Default)]
pub struct SessionStore {
    slot: RwLock<Option<Arc<VectorIndex>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active index wholesale. The previous index becomes
    /// unreachable once outstanding readers drop their `Arc`s.
    pub fn set(&self, index: Arc<VectorIndex>) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(index);
    }

    /// The current index, or `None` before the first successful ingestion.
    pub fn get(&self) -> Option<Arc<VectorIndex>> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }
}

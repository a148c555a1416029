use super::ContextId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Mutual exclusion keyed by context identity.
///
/// Every analyze and transform step on a context runs inside [`ContextLocks::with`].
/// The lock is released when the closure returns or unwinds; a poisoned lock is
/// recovered because the guarded data lives in the context itself.
#[derive(Debug, Default)]
pub struct ContextLocks {
    locks: Mutex<HashMap<ContextId, Arc<Mutex<()>>>>,
}

impl ContextLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: &ContextId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(id.clone()).or_default().clone()
    }

    pub fn with<T>(&self, id: &ContextId, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

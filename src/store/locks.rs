//! Per-collection reader/writer locks

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

type Registry = Arc<Mutex<HashMap<String, Arc<RwLock<()>>>>>;

/// A registry of one `RwLock` per collection name
///
/// Mutations of a collection take its write lock for the whole
/// load-modify-persist cycle; reads take the read lock. Different names use
/// different locks and never wait on each other. A name's entry lives only as
/// long as some task holds or waits for its lock.
#[derive(Debug, Clone, Default)]
pub struct CollectionLocks {
    locks: Registry,
}

/// Access to one collection, released on drop
pub struct CollectionGuard<G> {
    guard: Option<G>,
    name: String,
    locks: Registry,
}

impl<G> Drop for CollectionGuard<G> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Only the registry still refers to the lock
        if locks
            .get(&self.name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.name);
        }
    }
}

impl CollectionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, name: &str) -> Arc<RwLock<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(name.to_string()).or_default().clone()
    }

    fn guard<G>(&self, name: &str, guard: G) -> CollectionGuard<G> {
        CollectionGuard {
            guard: Some(guard),
            name: name.to_string(),
            locks: self.locks.clone(),
        }
    }

    /// Shared access to `name`
    pub async fn read(&self, name: &str) -> CollectionGuard<OwnedRwLockReadGuard<()>> {
        let guard = self.lock_for(name).read_owned().await;
        self.guard(name, guard)
    }

    /// Exclusive access to `name`
    pub async fn write(&self, name: &str) -> CollectionGuard<OwnedRwLockWriteGuard<()>> {
        let guard = self.lock_for(name).write_owned().await;
        self.guard(name, guard)
    }

    /// Number of names with a live lock
    pub(crate) fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

//! Per-group mutual exclusion.
//!
//! Two recosts of the same group must never overlap; different groups never
//! contend. Locks are handed out once per group and shared by every service
//! built from the same registry.

use std::sync::Arc;

use dashmap::DashMap;
use kardex_core::kardex::GroupKey;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-group async locks.
#[derive(Debug, Clone, Default)]
pub struct GroupLocks {
    locks: Arc<DashMap<GroupKey, Arc<Mutex<()>>>>,
}

impl GroupLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `group`.
    ///
    /// The guard must be held for the whole unit of work and released after
    /// commit or rollback. Not re-entrant.
    pub async fn acquire(&self, group: &GroupKey) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(group.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops the entries of groups nobody holds or waits on.
    ///
    /// Guards and waiters keep their own clone of the lock, so an entry whose
    /// only owner is the map is idle. Returns the number of entries removed.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of groups currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no group is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

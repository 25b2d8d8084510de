//! Per-resource mutual exclusion
//!
//! Load → mutate → save for one resource must never interleave with another
//! cycle for the same resource. Distinct resources share no lock.

use std::sync::Arc;

use calrelay_domain::ResourceId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily populated table of one async mutex per resource.
#[derive(Debug, Default, Clone)]
pub struct ResourceLocks {
    inner: Arc<DashMap<ResourceId, Arc<Mutex<()>>>>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `resource`.
    ///
    /// The map shard is released before awaiting, so waiting on one resource
    /// never blocks lookups for another.
    pub async fn acquire(&self, resource: &ResourceId) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(self.inner.entry(resource.clone()).or_default().value());
        mutex.lock_owned().await
    }
}

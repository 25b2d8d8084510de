//! Port interfaces for sync operations

use async_trait::async_trait;
use calrelay_domain::{ChangePage, DiffEvent, ResourceId, Result, SyncState};
use chrono::{DateTime, Utc};

/// Remote change feed for a calendar-like collection.
#[async_trait]
pub trait ChangeFeedProvider: Send + Sync {
    /// List contents from `since` forward, one page at a time.
    ///
    /// Callers pass the same `since` for every page of one listing.
    async fn list_baseline(
        &self,
        resource: &ResourceId,
        since: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<ChangePage>;

    /// List changes since `cursor`, one page at a time.
    ///
    /// Returns `CalRelayError::CursorExpired` when the provider no longer
    /// accepts the cursor.
    async fn list_incremental(
        &self,
        resource: &ResourceId,
        cursor: &str,
        page_token: Option<&str>,
    ) -> Result<ChangePage>;
}

/// Durable per-resource sync state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the record for `resource`, or an empty state if none exists.
    async fn load(&self, resource: &ResourceId) -> Result<SyncState>;

    /// Replace the record for `resource`. Readers never observe a partial write.
    async fn save(&self, resource: &ResourceId, state: &SyncState) -> Result<()>;
}

/// Downstream consumer of classified diffs.
#[async_trait]
pub trait DiffSink: Send + Sync {
    /// Deliver one event. Failures are reported but never affect sync state.
    async fn deliver(&self, event: &DiffEvent) -> Result<()>;
}

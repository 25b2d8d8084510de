//! Sync engine - core business logic
//!
//! Maintains, per resource, a cursor into the provider's change stream and a
//! map of last reported revision markers. Two primitive operations act on an
//! explicit [`SyncState`]:
//!
//! - [`SyncEngine::bootstrap`] lists the current contents and establishes a
//!   cursor without emitting diffs.
//! - [`SyncEngine::incremental`] consumes every change page since the cursor,
//!   classifies each item, hands the resulting diffs to the dispatcher and
//!   persists the new state once.
//!
//! Both expect the caller to hold the resource lock. [`SyncEngine::sync_resource`],
//! [`SyncEngine::ensure_baseline`] and [`SyncEngine::reset`] take the lock
//! themselves and are what request handlers call.

use std::sync::Arc;
use std::time::Duration;

use calrelay_domain::{CalRelayError, DiffEvent, ResourceId, Result, SyncConfig, SyncState};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::classifier::{apply_changes, collect_baseline};
use super::dispatch::DiffDispatcher;
use super::locks::ResourceLocks;
use super::ports::{ChangeFeedProvider, DiffSink, StateStore};

/// Result of one incremental pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalSync {
    pub state: SyncState,
    pub events: Vec<DiffEvent>,
    /// The provider rejected the cursor; `state.cursor` has been cleared.
    pub cursor_expired: bool,
}

/// What a locked sync pass did for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No cursor was stored; a fresh baseline was recorded.
    Bootstrapped { items: usize },
    /// Changes were consumed and the cursor advanced.
    Synced { events: usize },
    /// Cursor cleared; the next pass re-bootstraps.
    CursorExpired,
    /// Nothing was persisted; a later notification retries.
    Failed { error: CalRelayError },
}

/// Incremental synchronization engine
pub struct SyncEngine {
    provider: Arc<dyn ChangeFeedProvider>,
    store: Arc<dyn StateStore>,
    dispatcher: DiffDispatcher,
    locks: ResourceLocks,
    emit_unchanged: bool,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(
        provider: Arc<dyn ChangeFeedProvider>,
        store: Arc<dyn StateStore>,
        sink: Arc<dyn DiffSink>,
    ) -> Self {
        Self {
            provider,
            store,
            dispatcher: DiffDispatcher::new(sink),
            locks: ResourceLocks::new(),
            emit_unchanged: false,
        }
    }

    /// Apply sync tuning from configuration.
    pub fn with_config(mut self, config: &SyncConfig) -> Self {
        self.emit_unchanged = config.emit_unchanged;
        self
    }

    /// Report items whose marker did not change as `Updated`.
    ///
    /// Off by default, which keeps duplicate notifications idempotent.
    pub fn with_emit_unchanged(mut self, enabled: bool) -> Self {
        self.emit_unchanged = enabled;
        self
    }

    /// Upper bound on a single sink delivery.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.dispatcher = self.dispatcher.with_timeout(timeout);
        self
    }

    /// Capacity of the pending-delivery queue.
    pub fn with_delivery_queue(mut self, capacity: usize) -> Self {
        self.dispatcher = self.dispatcher.with_capacity(capacity);
        self
    }

    /// Wait for every diff enqueued so far to reach the sink.
    pub async fn flush_deliveries(&self) {
        self.dispatcher.flush().await;
    }

    /// Lock table guarding per-resource state.
    pub fn locks(&self) -> &ResourceLocks {
        &self.locks
    }

    /// Establish a baseline snapshot for a resource with no cursor.
    ///
    /// Emits no diffs. The returned state is not persisted; callers save it.
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn bootstrap(&self, resource: &ResourceId, state: &SyncState) -> Result<SyncState> {
        if state.is_bootstrapped() {
            return Err(CalRelayError::InvalidInput(format!(
                "resource {resource} already has a cursor; bootstrap requires a cleared state"
            )));
        }

        let mut next = SyncState::default();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;
        // Every page repeats the same query window.
        let since = Utc::now();

        loop {
            let page = self.provider.list_baseline(resource, since, page_token.as_deref()).await?;
            pages += 1;
            collect_baseline(&mut next.items, &page.items);

            page_token = page.next_page_token;
            if page_token.is_none() {
                next.cursor = page.next_cursor;
                break;
            }
        }

        if next.cursor.is_none() {
            return Err(CalRelayError::Provider(format!(
                "baseline listing for {resource} ended without a cursor"
            )));
        }

        info!(resource = %resource, items = next.items.len(), pages, "baseline established");
        Ok(next)
    }

    /// Consume all changes since `state.cursor`, deliver diffs, persist once.
    ///
    /// On an expired cursor the cursor is cleared and persisted with items
    /// untouched, and no diffs are emitted. Any other error leaves the stored
    /// state as it was.
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn incremental(
        &self,
        resource: &ResourceId,
        state: &SyncState,
    ) -> Result<IncrementalSync> {
        let Some(cursor) = state.cursor.as_deref() else {
            return Err(CalRelayError::InvalidInput(format!(
                "resource {resource} has no cursor; bootstrap first"
            )));
        };

        let mut items = state.items.clone();
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut received = 0usize;
        let next_cursor;

        loop {
            let page = match self.provider.list_incremental(resource, cursor, page_token.as_deref()).await {
                Ok(page) => page,
                Err(CalRelayError::CursorExpired(reason)) => {
                    warn!(resource = %resource, reason = %reason, "cursor expired, clearing for re-bootstrap");
                    let mut expired = state.clone();
                    expired.clear_cursor();
                    self.store.save(resource, &expired).await?;
                    return Ok(IncrementalSync { state: expired, events: Vec::new(), cursor_expired: true });
                }
                Err(err) => return Err(err),
            };

            received += page.items.len();
            events.extend(apply_changes(resource, &mut items, &page.items, self.emit_unchanged));

            page_token = page.next_page_token;
            if page_token.is_none() {
                next_cursor = page.next_cursor;
                break;
            }
        }

        if received == 0 {
            debug!(resource = %resource, "notification with no diffs");
        }
        if next_cursor.is_none() {
            warn!(resource = %resource, "final change page carried no cursor; keeping previous cursor");
        }

        let next = SyncState { cursor: next_cursor.or_else(|| state.cursor.clone()), items };

        // Diffs are queued before the cursor moves past them.
        self.dispatcher.dispatch(events.clone());
        self.store.save(resource, &next).await?;

        info!(resource = %resource, received, events = events.len(), "incremental sync committed");
        Ok(IncrementalSync { state: next, events, cursor_expired: false })
    }

    /// Bring one resource up to date, serialized against other passes on the
    /// same resource.
    ///
    /// Never returns an error: failures degrade to [`SyncOutcome::Failed`]
    /// with nothing persisted.
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn sync_resource(&self, resource: &ResourceId) -> SyncOutcome {
        let _guard = self.locks.acquire(resource).await;

        let state = match self.store.load(resource).await {
            Ok(state) => state,
            Err(error) => {
                warn!(resource = %resource, error = %error, "failed to load sync state");
                return SyncOutcome::Failed { error };
            }
        };

        if !state.is_bootstrapped() {
            return match self.bootstrap_and_save(resource, &state).await {
                Ok(next) => SyncOutcome::Bootstrapped { items: next.items.len() },
                Err(error) => {
                    warn!(resource = %resource, error = %error, "lazy re-bootstrap failed");
                    SyncOutcome::Failed { error }
                }
            };
        }

        match self.incremental(resource, &state).await {
            Ok(result) if result.cursor_expired => SyncOutcome::CursorExpired,
            Ok(result) => SyncOutcome::Synced { events: result.events.len() },
            Err(error) => {
                warn!(resource = %resource, error = %error, kind = error.label(), "incremental sync failed");
                SyncOutcome::Failed { error }
            }
        }
    }

    /// Make sure a baseline exists for `resource`, bootstrapping if needed.
    pub async fn ensure_baseline(&self, resource: &ResourceId) -> Result<SyncState> {
        let _guard = self.locks.acquire(resource).await;

        let state = self.store.load(resource).await?;
        if state.is_bootstrapped() {
            debug!(resource = %resource, "baseline already present");
            return Ok(state);
        }

        self.bootstrap_and_save(resource, &state).await
    }

    /// Administrative reset: forget the cursor so the next pass re-bootstraps.
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn reset(&self, resource: &ResourceId) -> Result<()> {
        let _guard = self.locks.acquire(resource).await;

        let mut state = self.store.load(resource).await?;
        state.clear_cursor();
        self.store.save(resource, &state).await?;

        info!(resource = %resource, "sync state reset");
        Ok(())
    }

    async fn bootstrap_and_save(&self, resource: &ResourceId, state: &SyncState) -> Result<SyncState> {
        let next = self.bootstrap(resource, state).await?;
        self.store.save(resource, &next).await?;
        Ok(next)
    }
}

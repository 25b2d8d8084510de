use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use calrelay_core::{DiffSink, StateStore, SubscriptionRegistry};
use calrelay_domain::{
    CalRelayError, DiffEvent, DiffKind, ResourceId, Result as DomainResult, Subscription, SyncState,
};
use chrono::{DateTime, Utc};

/// In-memory `StateStore` that counts saves.
#[derive(Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<ResourceId, SyncState>>,
    saves: AtomicUsize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a state without counting it as a save.
    pub fn seed(&self, resource: &ResourceId, cursor: &str, items: &[(&str, &str)]) {
        let state = SyncState {
            cursor: Some(cursor.to_string()),
            items: items.iter().map(|(id, marker)| (id.to_string(), marker.to_string())).collect(),
        };
        self.states.lock().unwrap().insert(resource.clone(), state);
    }

    pub fn get(&self, resource: &ResourceId) -> SyncState {
        self.states.lock().unwrap().get(resource).cloned().unwrap_or_default()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, resource: &ResourceId) -> DomainResult<SyncState> {
        Ok(self.get(resource))
    }

    async fn save(&self, resource: &ResourceId, state: &SyncState) -> DomainResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.states.lock().unwrap().insert(resource.clone(), state.clone());
        Ok(())
    }
}

/// Sink whose deliveries never complete.
#[derive(Default)]
pub struct StalledSink {
    attempts: AtomicUsize,
}

impl StalledSink {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiffSink for StalledSink {
    async fn deliver(&self, _event: &DiffEvent) -> DomainResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Sink that records every delivery, optionally failing each one.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiffEvent>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: AtomicBool::new(true), ..Self::default() }
    }

    pub fn events(&self) -> Vec<DiffEvent> {
        self.events.lock().unwrap().clone()
    }

    /// `(kind, item_id)` pairs in delivery order.
    pub fn kinds(&self) -> Vec<(DiffKind, String)> {
        self.events().into_iter().map(|event| (event.kind, event.item_id)).collect()
    }
}

#[async_trait]
impl DiffSink for RecordingSink {
    async fn deliver(&self, event: &DiffEvent) -> DomainResult<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(CalRelayError::Network("sink unavailable".into()));
        }
        Ok(())
    }
}

/// In-memory `SubscriptionRegistry`.
#[derive(Default)]
pub struct MemoryRegistry {
    entries: Mutex<BTreeMap<String, Subscription>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriptionRegistry for MemoryRegistry {
    async fn register(
        &self,
        subscription_id: String,
        resource: &ResourceId,
        handle: String,
        expiry: Option<DateTime<Utc>>,
    ) -> DomainResult<Subscription> {
        let subscription = Subscription {
            subscription_id: subscription_id.clone(),
            resource_id: resource.clone(),
            handle,
            expiry,
        };
        self.entries.lock().unwrap().insert(subscription_id, subscription.clone());
        Ok(subscription)
    }

    async fn resolve(&self, subscription_id: &str) -> DomainResult<Option<Subscription>> {
        Ok(self.entries.lock().unwrap().get(subscription_id).cloned())
    }

    async fn deregister(&self, subscription_id: &str) -> DomainResult<Option<Subscription>> {
        Ok(self.entries.lock().unwrap().remove(subscription_id))
    }

    async fn list_all(&self) -> DomainResult<Vec<Subscription>> {
        Ok(self.entries.lock().unwrap().values().cloned().collect())
    }
}

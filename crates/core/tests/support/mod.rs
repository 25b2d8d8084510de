//! Shared test helpers for `calrelay-core` integration tests.
//!
//! In-memory fakes for every port so engine and watch tests can script
//! provider responses and inspect what was persisted or delivered.

#![allow(dead_code)]

pub mod feed;
pub mod stores;

use std::sync::Arc;

use calrelay_core::SyncEngine;
pub use feed::{FakeWatcher, ScriptedFeed};
pub use stores::{MemoryRegistry, MemoryStateStore, RecordingSink, StalledSink};

pub fn resource(id: &str) -> calrelay_domain::ResourceId {
    calrelay_domain::ResourceId::new(id)
}

/// Engine wired to the given fakes.
pub fn engine(
    feed: &Arc<ScriptedFeed>,
    store: &Arc<MemoryStateStore>,
    sink: &Arc<RecordingSink>,
) -> SyncEngine {
    SyncEngine::new(feed.clone(), store.clone(), sink.clone())
}

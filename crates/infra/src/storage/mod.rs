//! File-backed persistence
//!
//! Per-resource sync state records and the subscription registry, both as
//! JSON documents replaced atomically on every save.

mod atomic;
pub mod state_store;
pub mod subscriptions;

pub use state_store::{safe_name, FileStateStore};
pub use subscriptions::FileSubscriptionRegistry;

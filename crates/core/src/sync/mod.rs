//! Incremental synchronization engine

pub mod classifier;
pub mod dispatch;
pub mod locks;
pub mod ports;
pub mod service;

pub use dispatch::DiffDispatcher;
pub use locks::ResourceLocks;
pub use service::{IncrementalSync, SyncEngine, SyncOutcome};

//! # CalRelay Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The incremental synchronization engine
//! - Push subscription orchestration
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `calrelay-domain`
//! - No filesystem, HTTP, or provider-specific code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;
pub mod watch;

pub use sync::ports::{ChangeFeedProvider, DiffSink, StateStore};
pub use sync::{DiffDispatcher, IncrementalSync, ResourceLocks, SyncEngine, SyncOutcome};
pub use watch::ports::{SubscriptionRegistry, WatchProvider};
pub use watch::{FailedWatch, NotificationOutcome, WatchReport, WatchService};

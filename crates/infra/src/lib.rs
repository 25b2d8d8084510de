//! # CalRelay Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Google Calendar change feed and push channel adapter
//! - File-backed sync state and subscription stores
//! - Diff sinks (HTTP webhook, log only)
//! - Configuration loading and the shared HTTP client
//!
//! ## Architecture
//! - Implements traits defined in `calrelay-core`
//! - Contains all "impure" code (filesystem, HTTP)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod sinks;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::GoogleCalendarFeed;
pub use sinks::{LoggingDiffSink, WebhookDiffSink};
pub use storage::{FileStateStore, FileSubscriptionRegistry};

//! # CalRelay Domain
//!
//! Business domain types and models for CalRelay.
//!
//! This crate contains:
//! - Sync state, change feed and diff event types
//! - Subscription records
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other CalRelay crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use types::*;

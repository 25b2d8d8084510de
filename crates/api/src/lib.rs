//! # CalRelay API
//!
//! HTTP gateway layer - routes, application context and server entry point.
//!
//! This crate contains:
//! - The axum router receiving provider push callbacks
//! - Application context (dependency injection)
//! - Tracing setup and the serve loop used by the `calrelay` binary
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Handlers only translate HTTP to service calls

pub mod context;
pub mod routes;
pub mod server;
pub mod utils;

pub use context::AppContext;
pub use routes::router;
pub use server::serve;

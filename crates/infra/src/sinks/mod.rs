//! Diff sink adapters

pub mod logging;
pub mod webhook;

pub use logging::LoggingDiffSink;
pub use webhook::WebhookDiffSink;

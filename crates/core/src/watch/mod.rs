//! Push subscription orchestration

pub mod ports;
pub mod service;

pub use service::{FailedWatch, NotificationOutcome, WatchReport, WatchService};

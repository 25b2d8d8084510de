//! Push subscription records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ResourceId;

/// Registered interest in push notifications for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Locally generated channel id, echoed back by the provider on every push.
    pub subscription_id: String,
    pub resource_id: ResourceId,
    /// Opaque handle returned by the provider, needed to unregister.
    pub handle: String,
    /// Advisory expiry reported by the provider.
    pub expiry: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Fresh channel id for a new registration epoch.
    ///
    /// The provider echoes this id on every push, so it is minted before the
    /// watch request rather than after.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Result of registering a watch with the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchRegistration {
    pub handle: String,
    pub expiry: Option<DateTime<Utc>>,
}

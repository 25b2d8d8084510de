//! Port interfaces for push subscriptions

use async_trait::async_trait;
use calrelay_domain::{ResourceId, Result, Subscription, WatchRegistration};
use chrono::{DateTime, Utc};

/// Provider-side push channel management.
#[async_trait]
pub trait WatchProvider: Send + Sync {
    /// Ask the provider to push change notifications for `resource` to
    /// `callback_address`, tagged with `subscription_id`.
    async fn register_watch(
        &self,
        resource: &ResourceId,
        subscription_id: &str,
        callback_address: &str,
    ) -> Result<WatchRegistration>;

    /// Stop a previously registered channel.
    async fn unregister(&self, subscription: &Subscription) -> Result<()>;
}

/// Durable map of subscription id to the resource it concerns.
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Record a new subscription.
    async fn register(
        &self,
        subscription_id: String,
        resource: &ResourceId,
        handle: String,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<Subscription>;

    /// Look up a subscription by id.
    async fn resolve(&self, subscription_id: &str) -> Result<Option<Subscription>>;

    /// Remove a subscription, returning it if it existed.
    async fn deregister(&self, subscription_id: &str) -> Result<Option<Subscription>>;

    /// All known subscriptions.
    async fn list_all(&self) -> Result<Vec<Subscription>>;
}

//! Subscription registry stored as a single JSON document
//!
//! Layout: `{ "<channel id>": { "calendar_id", "resource_id", "expiration" } }`
//! with `resource_id` holding the provider handle and `expiration` epoch
//! milliseconds as a string.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calrelay_core::SubscriptionRegistry;
use calrelay_domain::{ResourceId, Result, Subscription};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::atomic::{read_json, write_json};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChannelRecord {
    calendar_id: String,
    resource_id: String,
    #[serde(default)]
    expiration: Option<String>,
}

impl ChannelRecord {
    fn from_subscription(subscription: &Subscription) -> Self {
        Self {
            calendar_id: subscription.resource_id.to_string(),
            resource_id: subscription.handle.clone(),
            expiration: subscription.expiry.map(|at| at.timestamp_millis().to_string()),
        }
    }

    fn into_subscription(self, subscription_id: String) -> Subscription {
        let expiry = self
            .expiration
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis);

        Subscription {
            subscription_id,
            resource_id: ResourceId::from(self.calendar_id),
            handle: self.resource_id,
            expiry,
        }
    }
}

type Channels = BTreeMap<String, ChannelRecord>;

/// File-backed [`SubscriptionRegistry`].
///
/// The whole document is loaded and saved on each mutation; an async mutex
/// serializes read-modify-write cycles within the process.
#[derive(Debug)]
pub struct FileSubscriptionRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSubscriptionRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_channels(&self) -> Result<Channels> {
        Ok(read_json::<Channels>(&self.path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl SubscriptionRegistry for FileSubscriptionRegistry {
    async fn register(
        &self,
        subscription_id: String,
        resource: &ResourceId,
        handle: String,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<Subscription> {
        let _guard = self.lock.lock().await;

        let subscription =
            Subscription { subscription_id: subscription_id.clone(), resource_id: resource.clone(), handle, expiry };
        let mut channels = self.load_channels().await?;
        channels.insert(subscription_id, ChannelRecord::from_subscription(&subscription));
        write_json(&self.path, &channels).await?;

        info!(subscription_id = %subscription.subscription_id, resource = %resource, total = channels.len(), "subscription registered");
        Ok(subscription)
    }

    async fn resolve(&self, subscription_id: &str) -> Result<Option<Subscription>> {
        let _guard = self.lock.lock().await;

        let mut channels = self.load_channels().await?;
        Ok(channels.remove(subscription_id).map(|record| record.into_subscription(subscription_id.to_string())))
    }

    async fn deregister(&self, subscription_id: &str) -> Result<Option<Subscription>> {
        let _guard = self.lock.lock().await;

        let mut channels = self.load_channels().await?;
        let Some(record) = channels.remove(subscription_id) else {
            debug!(subscription_id, "deregister for unknown subscription");
            return Ok(None);
        };
        write_json(&self.path, &channels).await?;

        Ok(Some(record.into_subscription(subscription_id.to_string())))
    }

    async fn list_all(&self) -> Result<Vec<Subscription>> {
        let _guard = self.lock.lock().await;

        Ok(self
            .load_channels()
            .await?
            .into_iter()
            .map(|(id, record)| record.into_subscription(id))
            .collect())
    }
}

//! Watch service - subscription lifecycle and notification dispatch
//!
//! Ties the subscription registry to the sync engine:
//! 1. `start_watching` bootstraps every configured resource and registers a
//!    push channel for it
//! 2. `handle_notification` routes an inbound push to its resource
//! 3. `stop_watching` tears every known channel down

use std::sync::Arc;

use calrelay_domain::{CalRelayError, ResourceId, Result, Subscription};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{SubscriptionRegistry, WatchProvider};
use crate::sync::{SyncEngine, SyncOutcome};

/// A resource that could not be watched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedWatch {
    pub resource_id: ResourceId,
    pub error: String,
}

/// Per-resource outcome of a registration batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WatchReport {
    pub started: Vec<Subscription>,
    pub failed: Vec<FailedWatch>,
}

/// What happened to one inbound push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Missing or unknown subscription id.
    Ignored,
    Dispatched { resource_id: ResourceId, outcome: SyncOutcome },
}

/// Watch service
pub struct WatchService {
    engine: Arc<SyncEngine>,
    watcher: Arc<dyn WatchProvider>,
    registry: Arc<dyn SubscriptionRegistry>,
    resources: Vec<ResourceId>,
    callback_address: Option<String>,
}

impl WatchService {
    /// Create a new watch service
    pub fn new(
        engine: Arc<SyncEngine>,
        watcher: Arc<dyn WatchProvider>,
        registry: Arc<dyn SubscriptionRegistry>,
    ) -> Self {
        Self { engine, watcher, registry, resources: Vec::new(), callback_address: None }
    }

    /// Resources registered by [`Self::start_watching`].
    pub fn with_resources<I, R>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ResourceId>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Public address the provider should push to.
    pub fn with_callback_address(mut self, address: Option<String>) -> Self {
        self.callback_address = address.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Bootstrap and register a push channel for every configured resource.
    ///
    /// Fails up front with `CalRelayError::Config` when no callback address
    /// or no resources are configured. Otherwise a failing resource is
    /// reported in [`WatchReport::failed`] without aborting the batch.
    #[instrument(skip(self))]
    pub async fn start_watching(&self) -> Result<WatchReport> {
        let Some(callback) = self.callback_address.as_deref() else {
            return Err(CalRelayError::Config("callback address (WEBHOOK_ADDRESS) is not set".into()));
        };
        if self.resources.is_empty() {
            return Err(CalRelayError::Config(
                "no resources configured (CALENDAR_ID or CALENDAR_IDS)".into(),
            ));
        }

        let mut report = WatchReport::default();
        for resource in &self.resources {
            match self.start_one(resource, callback).await {
                Ok(subscription) => report.started.push(subscription),
                Err(err) => {
                    error!(resource = %resource, error = %err, "failed to start watch");
                    report.failed.push(FailedWatch { resource_id: resource.clone(), error: err.to_string() });
                }
            }
        }

        info!(started = report.started.len(), failed = report.failed.len(), "watch registration finished");
        Ok(report)
    }

    async fn start_one(&self, resource: &ResourceId, callback: &str) -> Result<Subscription> {
        let baseline = self.engine.ensure_baseline(resource).await?;
        debug!(resource = %resource, items = baseline.items.len(), "baseline ready");

        let subscription_id = Subscription::new_id();
        let registration = self.watcher.register_watch(resource, &subscription_id, callback).await?;

        self.registry
            .register(subscription_id, resource, registration.handle, registration.expiry)
            .await
    }

    /// Route one push notification to the sync engine.
    ///
    /// Unknown or missing subscription ids are ignored; they usually belong to
    /// expired or foreign channels.
    #[instrument(skip(self))]
    pub async fn handle_notification(
        &self,
        subscription_id: Option<&str>,
        resource_state: Option<&str>,
    ) -> NotificationOutcome {
        let Some(subscription_id) = subscription_id.filter(|id| !id.is_empty()) else {
            debug!("push without channel id");
            return NotificationOutcome::Ignored;
        };

        let subscription = match self.registry.resolve(subscription_id).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                debug!(subscription_id, "push for unknown channel");
                return NotificationOutcome::Ignored;
            }
            Err(err) => {
                warn!(subscription_id, error = %err, "failed to resolve subscription");
                return NotificationOutcome::Ignored;
            }
        };

        let outcome = self.engine.sync_resource(&subscription.resource_id).await;
        info!(
            resource = %subscription.resource_id,
            state = resource_state.unwrap_or("unknown"),
            ?outcome,
            "push handled"
        );

        NotificationOutcome::Dispatched { resource_id: subscription.resource_id, outcome }
    }

    /// Unregister every known channel and drop it from the registry.
    ///
    /// Provider failures are logged; the local record is removed regardless.
    /// Returns `CalRelayError::NotFound` when nothing is registered.
    #[instrument(skip(self))]
    pub async fn stop_watching(&self) -> Result<Vec<Subscription>> {
        let subscriptions = self.registry.list_all().await?;
        if subscriptions.is_empty() {
            return Err(CalRelayError::NotFound("no active channels".into()));
        }

        let mut stopped = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            if let Err(err) = self.watcher.unregister(&subscription).await {
                warn!(
                    subscription_id = %subscription.subscription_id,
                    error = %err,
                    "provider unregister failed; dropping local record anyway"
                );
            }
            self.registry.deregister(&subscription.subscription_id).await?;
            stopped.push(subscription);
        }

        info!(stopped = stopped.len(), "watches stopped");
        Ok(stopped)
    }

    pub async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        self.registry.list_all().await
    }

    /// Administrative reset of one resource's cursor.
    pub async fn reset_resource(&self, resource: &ResourceId) -> Result<()> {
        self.engine.reset(resource).await
    }
}

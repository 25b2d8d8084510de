//! Application context - dependency injection container

use std::sync::Arc;

use calrelay_core::{
    ChangeFeedProvider, DiffSink, StateStore, SubscriptionRegistry, SyncEngine, WatchProvider,
    WatchService,
};
use calrelay_domain::{Config, Result};
use calrelay_infra::{
    FileStateStore, FileSubscriptionRegistry, GoogleCalendarFeed, LoggingDiffSink, WebhookDiffSink,
};
use tracing::info;

/// Adapters the services are assembled from.
pub struct Adapters {
    pub provider: Arc<dyn ChangeFeedProvider>,
    pub watcher: Arc<dyn WatchProvider>,
    pub store: Arc<dyn StateStore>,
    pub registry: Arc<dyn SubscriptionRegistry>,
    pub sink: Arc<dyn DiffSink>,
}

/// Application context holding all services
pub struct AppContext {
    pub config: Config,
    pub engine: Arc<SyncEngine>,
    pub watch: Arc<WatchService>,
}

impl AppContext {
    /// Build the production wiring: Google Calendar, file stores and the
    /// configured diff sink.
    pub fn new(config: Config) -> Result<Self> {
        let feed = Arc::new(GoogleCalendarFeed::from_config(&config)?);

        let sink: Arc<dyn DiffSink> = match WebhookDiffSink::from_config(&config.sink)? {
            Some(webhook) => {
                info!(url = %webhook.url(), "diff events forwarded to webhook");
                Arc::new(webhook)
            }
            None => {
                info!("no sink URL configured; diff events are logged only");
                Arc::new(LoggingDiffSink)
            }
        };

        let adapters = Adapters {
            provider: feed.clone(),
            watcher: feed,
            store: Arc::new(FileStateStore::new(config.storage.state_dir.clone())),
            registry: Arc::new(FileSubscriptionRegistry::new(config.storage.channels_file.clone())),
            sink,
        };

        info!(
            resources = config.resources.len(),
            state_dir = %config.storage.state_dir.display(),
            channels_file = %config.storage.channels_file.display(),
            "application context initialized"
        );
        Ok(Self::from_parts(config, adapters))
    }

    /// Assemble the services from explicit adapters.
    pub fn from_parts(config: Config, adapters: Adapters) -> Self {
        let engine = Arc::new(
            SyncEngine::new(adapters.provider, adapters.store, adapters.sink)
                .with_config(&config.sync)
                .with_delivery_timeout(config.sink.timeout()),
        );

        let watch = Arc::new(
            WatchService::new(engine.clone(), adapters.watcher, adapters.registry)
                .with_resources(config.resources.iter().map(String::as_str))
                .with_callback_address(config.server.callback_address.clone()),
        );

        Self { config, engine, watch }
    }
}

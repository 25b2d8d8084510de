//! Configuration structures
//!
//! Every store, provider and sink receives its settings from an explicit
//! [`Config`] value. Nothing reads process-wide paths on its own.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_CHANNELS_FILE, DEFAULT_PROVIDER_TIMEOUT_SECS,
    DEFAULT_SINK_TIMEOUT_SECS, DEFAULT_STATE_DIR, GOOGLE_CALENDAR_API_BASE, MAX_PAGE_SIZE,
};

/// Top-level relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub sink: SinkConfig,
    /// Calendars to track.
    pub resources: Vec<String>,
}

/// HTTP gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Public address the provider pushes notifications to.
    pub callback_address: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: DEFAULT_BIND_ADDR.to_string(), callback_address: None }
    }
}

/// Remote change-feed provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_base: String,
    /// Bearer token obtained by external credential tooling.
    pub access_token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            access_token: None,
            timeout_seconds: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

/// Durable storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_dir: PathBuf,
    pub channels_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            channels_file: PathBuf::from(DEFAULT_CHANNELS_FILE),
        }
    }
}

/// Sync engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub page_size: u32,
    /// Emit an `Updated` diff even when the revision marker is unchanged.
    pub emit_unchanged: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { page_size: MAX_PAGE_SIZE, emit_unchanged: false }
    }
}

impl SyncConfig {
    /// Page size clamped to the provider's accepted range.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Downstream diff sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Webhook receiving diff events. Diffs are only logged when unset.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self { url: None, api_key: None, timeout_seconds: DEFAULT_SINK_TIMEOUT_SECS }
    }
}

impl SinkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

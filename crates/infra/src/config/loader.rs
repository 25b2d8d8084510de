//! Configuration loader
//!
//! Loads relay configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If any recognised environment variable is set, configuration is built
//!    from the environment on top of defaults
//! 2. Otherwise probes the standard locations for a TOML or JSON file
//! 3. With neither, defaults are used; missing resources or callback address
//!    surface later when watches are started
//!
//! ## Environment Variables
//! - `CALENDAR_IDS`: Comma separated calendars to track
//! - `CALENDAR_ID`: Single calendar, used when `CALENDAR_IDS` is unset
//! - `WEBHOOK_ADDRESS`: Public callback address for push notifications
//! - `CALRELAY_BIND_ADDR`: Gateway listen address
//! - `CALRELAY_STATE_DIR`: Directory of per-calendar state records
//! - `CALRELAY_CHANNELS_FILE`: Subscription registry file
//! - `CALRELAY_ACCESS_TOKEN`: Bearer token for the calendar API
//! - `CALRELAY_API_BASE`: Calendar API base URL
//! - `CALRELAY_PROVIDER_TIMEOUT_SECS`: Calendar API request timeout
//! - `CALRELAY_SINK_URL`: Diff webhook; diffs are only logged when unset
//! - `CALRELAY_SINK_API_KEY`: Value of the sink's `x-api-key` header
//! - `CALRELAY_SINK_TIMEOUT_SECS`: Diff delivery timeout
//! - `CALRELAY_EMIT_UNCHANGED`: Report unchanged items as updates (true/false)
//! - `CALRELAY_BASELINE_PAGE_SIZE`: Items per listing page (1..=2500)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.toml` or `./config.json` (current working directory)
//! 2. `./calrelay.toml` or `./calrelay.json` (current working directory)
//! 3. `../config.toml` or `../config.json` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use calrelay_domain::{CalRelayError, Config, Result};

/// Every variable [`load_from_env`] reads.
pub const ENV_KEYS: &[&str] = &[
    "CALENDAR_IDS",
    "CALENDAR_ID",
    "WEBHOOK_ADDRESS",
    "CALRELAY_BIND_ADDR",
    "CALRELAY_STATE_DIR",
    "CALRELAY_CHANNELS_FILE",
    "CALRELAY_ACCESS_TOKEN",
    "CALRELAY_API_BASE",
    "CALRELAY_PROVIDER_TIMEOUT_SECS",
    "CALRELAY_SINK_URL",
    "CALRELAY_SINK_API_KEY",
    "CALRELAY_SINK_TIMEOUT_SECS",
    "CALRELAY_EMIT_UNCHANGED",
    "CALRELAY_BASELINE_PAGE_SIZE",
];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `CalRelayError::Config` if an environment value cannot be parsed
/// or a discovered config file is invalid.
pub fn load() -> Result<Config> {
    if env_configured() {
        let config = load_from_env()?;
        tracing::info!(resources = config.resources.len(), "Configuration loaded from environment variables");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::warn!("No configuration found in environment or standard locations, using defaults");
            Ok(Config::default())
        }
    }
}

/// Whether any recognised environment variable is set.
pub fn env_configured() -> bool {
    ENV_KEYS.iter().any(|key| env_opt(key).is_some())
}

/// Load configuration from environment variables
///
/// Unset variables keep their defaults.
///
/// # Errors
/// Returns `CalRelayError::Config` for values that fail to parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.resources = match env_opt("CALENDAR_IDS") {
        Some(list) => split_list(&list),
        None => env_opt("CALENDAR_ID").map(|id| vec![id]).unwrap_or_default(),
    };

    config.server.callback_address = env_opt("WEBHOOK_ADDRESS");
    if let Some(addr) = env_opt("CALRELAY_BIND_ADDR") {
        config.server.bind_addr = addr;
    }

    if let Some(dir) = env_opt("CALRELAY_STATE_DIR") {
        config.storage.state_dir = PathBuf::from(dir);
    }
    if let Some(file) = env_opt("CALRELAY_CHANNELS_FILE") {
        config.storage.channels_file = PathBuf::from(file);
    }

    config.provider.access_token = env_opt("CALRELAY_ACCESS_TOKEN");
    if let Some(base) = env_opt("CALRELAY_API_BASE") {
        config.provider.api_base = base;
    }
    if let Some(secs) = env_parse::<u64>("CALRELAY_PROVIDER_TIMEOUT_SECS")? {
        config.provider.timeout_seconds = secs;
    }

    config.sink.url = env_opt("CALRELAY_SINK_URL");
    config.sink.api_key = env_opt("CALRELAY_SINK_API_KEY");
    if let Some(secs) = env_parse::<u64>("CALRELAY_SINK_TIMEOUT_SECS")? {
        config.sink.timeout_seconds = secs;
    }

    config.sync.emit_unchanged = env_bool("CALRELAY_EMIT_UNCHANGED", false);
    if let Some(size) = env_parse::<u32>("CALRELAY_BASELINE_PAGE_SIZE")? {
        config.sync.page_size = size;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CalRelayError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CalRelayError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CalRelayError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CalRelayError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CalRelayError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CalRelayError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CalRelayError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| {
            ["config.toml", "config.json", "calrelay.toml", "calrelay.json"]
                .into_iter()
                .map(move |name| root.join(name))
        })
        .find(|path| path.exists())
}

/// Non-empty, trimmed environment value.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| CalRelayError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for CalRelay
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CalRelayError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider error: {0}")]
    Provider(String),

    /// The change-feed cursor is no longer accepted by the provider.
    #[error("Cursor expired: {0}")]
    CursorExpired(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CalRelayError {
    /// Stable label suitable for logging fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Provider(_) => "provider",
            Self::CursorExpired(_) => "cursor_expired",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether this is the distinguished "cursor gone" condition.
    pub fn is_cursor_expired(&self) -> bool {
        matches!(self, Self::CursorExpired(_))
    }
}

/// Result type alias for CalRelay operations
pub type Result<T> = std::result::Result<T, CalRelayError>;

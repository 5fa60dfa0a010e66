//! Core error types for pomobar-core.
//!
//! Invalid timer transitions are not errors (they are no-ops); everything
//! here comes from persistence, configuration or notification delivery.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomobar-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings store errors
    #[error("Settings store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// A preset name that neither the built-ins nor the config declare
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// The timer service has shut down and no longer accepts commands
    #[error("Timer service is not running")]
    ServiceStopped,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open settings store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another process
    #[error("Settings store is locked")]
    Locked,

    /// A stored value could not be parsed as the requested type
    #[error("Stored value for '{key}' is not valid: {value}")]
    InvalidValue { key: String, value: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

/// Notification delivery errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The platform refused to show notifications for this application
    #[error("Notification permission denied: {0}")]
    PermissionDenied(String),

    /// Delivery failed for any other reason
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

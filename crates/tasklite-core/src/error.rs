//! Core error types for tasklite-core.
//!
//! Storage and notification failures are absorbed at their boundaries and only
//! logged; the types here exist so those boundaries (and the CLI) can say what
//! went wrong. User-input validation is the one family surfaced to callers.

use std::path::PathBuf;
use thiserror::Error;

/// Umbrella error for operations that can fail outright.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("SQLite store: {0}")]
    Database(#[from] DatabaseError),

    #[error("Durable store: {0}")]
    Store(#[from] StoreError),

    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    /// Rejected user input.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The service task has exited and dropped its command channel.
    #[error("Timer service has stopped")]
    ServiceStopped,
}

/// Failures of the SQLite key-value backend.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Cannot open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cannot create directory {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite query: {0}")]
    QueryFailed(String),

    /// Another process holds the database (`SQLITE_BUSY` / `SQLITE_LOCKED`).
    #[error("Database busy")]
    Locked,
}

/// Errors raised by a key-value backend or while decoding a stored record.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not complete the operation.
    #[error("Storage backend unavailable: {0}")]
    Backend(String),

    /// The value stored under `key` is not valid JSON for the expected record.
    #[error("Corrupt record at '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be encoded.
    #[error("Failed to encode record for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures reading or editing `config.toml` or a settings key.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Cannot write {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Bad value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Malformed config: {0}")]
    ParseFailed(String),
}

/// User input that was refused. Nothing was changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A duration was non-numeric or not positive. `last_good` is the value
    /// the input should be reverted to.
    #[error("Invalid duration for '{field}': '{value}' (expected a positive number of minutes)")]
    InvalidDuration {
        field: String,
        value: String,
        last_good: u32,
    },

    #[error("'{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failures of a notification capability. Never escapes the notification sink.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The capability is not present on this system.
    #[error("{0} is not available")]
    Unavailable(String),

    /// The capability is present but the attempt failed.
    #[error("{strategy} failed: {message}")]
    Failed { strategy: String, message: String },

    /// The user has not granted permission.
    #[error("Notification permission denied")]
    PermissionDenied,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode::{DatabaseBusy, DatabaseLocked};
        match err.sqlite_error_code() {
            Some(DatabaseBusy | DatabaseLocked) => DatabaseError::Locked,
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Shorthand for results that fail with [`CoreError`].
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

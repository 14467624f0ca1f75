//! Core error types for qppe-core.
//!
//! The codec never fails and missing preferences are not errors, so the
//! hierarchy only covers persistence, configuration and account handling.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for qppe-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Preference/account store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Account management errors
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,
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

    /// Key does not exist in the configuration
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Account management errors.
#[derive(Error, Debug)]
pub enum AccountError {
    /// The checking service rejected the credentials; the caller may retry.
    #[error("Invalid credentials for '{username}', no grades found")]
    InvalidCredentials { username: String },

    /// The checking service failed for another reason
    #[error("Account check failed for '{username}': {message}")]
    CheckFailed { username: String, message: String },

    /// No stored account with this username
    #[error("Unknown account: {0}")]
    Unknown(String),

    /// Selection index outside the account list
    #[error("Index {index} out of bounds for account list (length: {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccountError {
    /// Whether the dialog should stay open and let the user try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccountError::InvalidCredentials { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

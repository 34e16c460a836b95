//! Error handling for the NovaTab core layer.
//!
//! This module defines the error types shared by everything built on top of
//! `novatab-core`, using `thiserror` for the `Display`/`Error` plumbing.
//!
//! - [`CoreError`] is the umbrella type for configuration, logging and
//!   filesystem failures.
//! - [`ConfigError`] covers loading and validating the application
//!   configuration file.
//! - [`LoggingError`] covers logging set-up.
//! - [`StoreError`] is returned by every [`crate::store::ConfigStore`]
//!   implementation. Callers in the domain layer recover from it locally.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for NovaTab.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors that occur while installing the global tracing subscriber.
    #[error("Logging Initialization Failed: {0}")]
    LoggingInitialization(String),

    /// Logging failures after initialisation.
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),

    /// Filesystem operations that are not covered by a more specific variant.
    #[error("Filesystem Error: {message} (Path: {path:?})")]
    Filesystem {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// General I/O errors.
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input provided to a function or method.
    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    /// Catch-all for unexpected internal errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Error type for configuration-related operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Parsed values are out of range or otherwise unusable.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A required base directory (config/data) could not be determined.
    #[error("Could not determine base directory for {dir_type}")]
    DirectoryUnavailable { dir_type: String },
}

/// Error type for logging-related operations.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    #[error("Failed to set log filter: {0}")]
    FilterError(String),

    #[error("Logging I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Failure of the durable key-value store.
///
/// Every variant names the key involved so that log lines can be correlated
/// with the document that failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot be reached at all (e.g. storage directory missing).
    #[error("Config store is not available: {0}")]
    NotAvailable(String),

    #[error("I/O failure on key '{key}'")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Value stored under key '{key}' is not valid JSON")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backend-specific failure that has no better classification.
    #[error("Config store backend error on key '{key}': {message}")]
    Backend { key: String, message: String },
}

impl StoreError {
    /// The key the failure relates to, when there is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            StoreError::NotAvailable(_) => None,
            StoreError::Io { key, .. }
            | StoreError::Serialization { key, .. }
            | StoreError::Backend { key, .. } => Some(key),
        }
    }
}

//! Configuration data structures.
//!
//! These describe the process-level `config.toml`, not the user's dashboard
//! settings (those live in the domain crate and are persisted through a
//! [`crate::store::ConfigStore`]). Missing sections and fields fall back to
//! [`super::defaults`]; unknown fields are rejected so that typos surface as
//! parse errors.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use super::defaults;

/// Settings for the logging subsystem.
///
/// ```
/// use novatab_core::config::LoggingConfig;
///
/// let log_config: LoggingConfig = toml::from_str(r#"level = "debug""#).unwrap();
/// assert_eq!(log_config.level, "debug");
/// assert_eq!(log_config.file_path, None);
/// assert_eq!(log_config.format, "text");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of "trace", "debug", "info", "warn", "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional log file. Relative paths are resolved against the data directory.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Where the file-backed config store keeps its JSON documents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// `None` selects the application data directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        defaults::default_storage_config()
    }
}

/// Outbound HTTP behaviour for image search and favicon probing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    #[serde(default = "defaults::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "defaults::default_user_agent")]
    pub user_agent: String,
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        defaults::default_network_config()
    }
}

/// Third-party image search endpoints and batch size.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    /// Number of image URLs requested per fetch.
    #[serde(default = "defaults::default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "defaults::default_unsplash_endpoint")]
    pub unsplash_endpoint: String,
    #[serde(default = "defaults::default_pexels_endpoint")]
    pub pexels_endpoint: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        defaults::default_images_config()
    }
}

/// Root of `config.toml`.
///
/// ```
/// use novatab_core::config::CoreConfig;
///
/// let loaded: CoreConfig = toml::from_str(r#"
/// [logging]
/// level = "warn"
///
/// [images]
/// batch_size = 10
/// "#).unwrap();
/// assert_eq!(loaded.logging.level, "warn");
/// assert_eq!(loaded.images.batch_size, 10);
/// assert_eq!(loaded.network.request_timeout_secs, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
    #[serde(default = "defaults::default_storage_config")]
    pub storage: StorageConfig,
    #[serde(default = "defaults::default_network_config")]
    pub network: NetworkConfig,
    #[serde(default = "defaults::default_images_config")]
    pub images: ImagesConfig,
}

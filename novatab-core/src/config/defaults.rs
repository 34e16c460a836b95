//! Default configuration values for NovaTab.
//!
//! Referenced from `#[serde(default = "...")]` attributes in [`super::types`].

use std::path::PathBuf;

use crate::config::{ImagesConfig, LoggingConfig, NetworkConfig, StorageConfig};

pub(crate) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

pub(crate) fn default_log_file_path() -> Option<PathBuf> {
    None
}

pub(crate) fn default_log_format() -> String {
    "text".to_string()
}

pub(crate) fn default_storage_config() -> StorageConfig {
    StorageConfig { directory: None }
}

pub(crate) fn default_network_config() -> NetworkConfig {
    NetworkConfig {
        request_timeout_secs: default_request_timeout_secs(),
        user_agent: default_user_agent(),
    }
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    10
}

pub(crate) fn default_user_agent() -> String {
    format!("NovaTab/{}", env!("CARGO_PKG_VERSION"))
}

pub(crate) fn default_images_config() -> ImagesConfig {
    ImagesConfig {
        batch_size: default_batch_size(),
        unsplash_endpoint: default_unsplash_endpoint(),
        pexels_endpoint: default_pexels_endpoint(),
    }
}

pub(crate) fn default_batch_size() -> u32 {
    30
}

pub(crate) fn default_unsplash_endpoint() -> String {
    "https://api.unsplash.com/photos/random".to_string()
}

pub(crate) fn default_pexels_endpoint() -> String {
    "https://api.pexels.com/v1/search".to_string()
}

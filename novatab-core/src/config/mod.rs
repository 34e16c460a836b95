//! Application configuration for NovaTab.
//!
//! - [`types`]: the `config.toml` schema ([`CoreConfig`] and its sections).
//! - [`defaults`]: default values referenced by the serde attributes.
//! - [`loader`]: [`ConfigLoader`], which reads, parses and validates the file.
//!
//! The user-facing dashboard settings are a different document; see the
//! `novatab-domain` settings module.

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{CoreConfig, ImagesConfig, LoggingConfig, NetworkConfig, StorageConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_config_default_sections() {
        let config = CoreConfig::default();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.network.request_timeout().as_secs(), 10);
        assert!(config.network.user_agent.starts_with("NovaTab/"));
        assert_eq!(config.images.batch_size, 30);
    }

    #[test]
    fn test_core_config_deserialize_minimal() {
        let config: CoreConfig = toml::from_str("[storage]\ndirectory = \"/var/lib/novatab\"\n").unwrap();
        assert_eq!(config.storage.directory, Some(std::path::PathBuf::from("/var/lib/novatab")));
        assert_eq!(config.logging, LoggingConfig::default());
    }
}

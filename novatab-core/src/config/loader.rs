//! Configuration loading.
//!
//! [`ConfigLoader::load`] reads `config.toml` from the application config
//! directory. A missing or empty file yields [`CoreConfig::default`]; any
//! other read failure, a TOML error, or a failed validation is returned to the
//! caller, who usually falls back to `init_minimal_logging` and defaults.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::CoreConfig;
use crate::error::{ConfigError, CoreError};
use crate::utils::paths::{get_app_data_dir, get_config_file_path};

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["text", "json"];
const MAX_BATCH_SIZE: u32 = 80;

/// Namespace for configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates `config.toml` from the application config directory.
    pub fn load() -> Result<CoreConfig, CoreError> {
        let path = get_config_file_path()?;
        Self::load_from_path(&path)
    }

    /// Loads and validates the configuration file at `path`.
    pub fn load_from_path(path: &Path) -> Result<CoreConfig, CoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                String::new()
            }
            Err(e) => {
                return Err(CoreError::Config(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                }));
            }
        };
        Self::load_from_str(&content)
    }

    /// Parses and validates configuration text. Blank text yields defaults.
    pub fn load_from_str(content: &str) -> Result<CoreConfig, CoreError> {
        let mut config = if content.trim().is_empty() {
            CoreConfig::default()
        } else {
            toml::from_str(content).map_err(ConfigError::ParseError)?
        };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    /// Normalises names to lowercase, checks ranges and resolves a relative
    /// log file path against the application data directory.
    pub fn validate_config(config: &mut CoreConfig) -> Result<(), CoreError> {
        let level = config.logging.level.to_lowercase();
        if !VALID_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'; expected one of {:?}",
                config.logging.level, VALID_LEVELS
            ))
            .into());
        }
        config.logging.level = level;

        let format = config.logging.format.to_lowercase();
        if !VALID_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log format '{}'; expected one of {:?}",
                config.logging.format, VALID_FORMATS
            ))
            .into());
        }
        config.logging.format = format;

        if let Some(file_path) = &config.logging.file_path {
            if file_path.is_relative() {
                config.logging.file_path = Some(get_app_data_dir()?.join(file_path));
            }
        }

        if config.network.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "network.request_timeout_secs must be greater than 0".to_string(),
            )
            .into());
        }

        if config.images.batch_size == 0 || config.images.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "images.batch_size must be between 1 and {}",
                MAX_BATCH_SIZE
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = tempdir().unwrap();
        let config = ConfigLoader::load_from_path(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_sections() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[logging]
level = "DEBUG"
format = "JSON"

[network]
request_timeout_secs = 3
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.network.request_timeout_secs, 3);
        assert_eq!(config.images.batch_size, 30);
        assert_eq!(config.storage.directory, None);
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = ConfigLoader::load_from_str("[logging]\nverbosity = 3\n").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_level_is_validation_error() {
        let err = ConfigLoader::load_from_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ValidationError(ref m)) if m.contains("loud")));
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(ConfigLoader::load_from_str("[images]\nbatch_size = 0\n").is_err());
        assert!(ConfigLoader::load_from_str("[images]\nbatch_size = 81\n").is_err());
        assert!(ConfigLoader::load_from_str("[images]\nbatch_size = 80\n").is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ConfigLoader::load_from_str("[network]\nrequest_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_relative_log_path_is_resolved() {
        let config = ConfigLoader::load_from_str("[logging]\nfile_path = \"logs/novatab.log\"\n").unwrap();
        let resolved = config.logging.file_path.unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with(PathBuf::from("logs/novatab.log")));
    }
}

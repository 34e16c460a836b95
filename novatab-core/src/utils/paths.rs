//! Application directory resolution.
//!
//! Built on `directories-next`. On Linux these resolve to the XDG locations,
//! e.g. `~/.config/novatab` and `~/.local/share/novatab`.

use std::path::PathBuf;
use directories_next::ProjectDirs;
use crate::error::{CoreError, ConfigError};

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "NovaTab";
const APPLICATION: &str = "novatab";

const CONFIG_FILE_NAME: &str = "config.toml";

fn project_dirs(dir_type: &str) -> Result<ProjectDirs, CoreError> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or_else(|| {
        CoreError::Config(ConfigError::DirectoryUnavailable {
            dir_type: dir_type.to_string(),
        })
    })
}

/// Directory holding `config.toml`.
pub fn get_app_config_dir() -> Result<PathBuf, CoreError> {
    project_dirs("Application Config").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Directory holding persisted dashboard state when no explicit storage
/// directory is configured.
pub fn get_app_data_dir() -> Result<PathBuf, CoreError> {
    project_dirs("Application Data").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Full path of the application configuration file.
pub fn get_config_file_path() -> Result<PathBuf, CoreError> {
    get_app_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

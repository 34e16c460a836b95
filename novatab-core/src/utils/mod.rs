//! General utilities for NovaTab core.
//!
//! - [`fs`]: directory creation mapped to [`crate::error::CoreError`].
//! - [`paths`]: application config/data directory resolution.

pub mod fs;
pub mod paths;

pub use fs::ensure_dir_exists;
pub use paths::{get_app_config_dir, get_app_data_dir, get_config_file_path};

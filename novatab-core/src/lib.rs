//! # NovaTab Core (`novatab-core`)
//!
//! Process-level infrastructure shared by the NovaTab dashboard:
//!
//! - **Errors**: [`CoreError`] with the specific [`ConfigError`], [`LoggingError`]
//!   and [`StoreError`] kinds.
//! - **Configuration**: `config.toml` loading and validation through
//!   [`ConfigLoader`] into a [`CoreConfig`].
//! - **Logging**: `tracing` subscriber setup with text/JSON output and an
//!   optional rolling log file.
//! - **Storage**: the [`ConfigStore`] key-value port that the dashboard
//!   settings are persisted through, with in-memory and file-backed adapters.
//! - **Utilities**: directory resolution and filesystem helpers.
//!
//! ```rust,no_run
//! use novatab_core::config::ConfigLoader;
//! use novatab_core::logging::{init_logging, init_minimal_logging};
//!
//! fn main() {
//!     init_minimal_logging();
//!     let config = ConfigLoader::load().unwrap_or_default();
//!     let _ = init_logging(&config.logging, true);
//!     tracing::info!("NovaTab core ready");
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod utils;

pub use config::{ConfigLoader, CoreConfig, LoggingConfig};
pub use error::{ConfigError, CoreError, LoggingError, StoreError};
pub use logging::{init_logging, init_minimal_logging};
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};

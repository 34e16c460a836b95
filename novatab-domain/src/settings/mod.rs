//! The dashboard settings document.
//!
//! - [`types`]: the document, its four sections and their defaults.
//! - [`merge`]: defaulting of stored values, shallow merge, pool state carried
//!   across saves, import validation.
//! - [`persistence`]: [`SettingsRepository`], typed access to the store keys.
//! - [`service`]: [`SettingsService`], the working copy and the save path that
//!   notifies the feature modules.

pub mod merge;
pub mod persistence;
pub mod service;
pub mod types;

pub use merge::{carry_pool_state, merge_stored, shallow_merge, validate_import};
pub use persistence::{SettingsRepository, INSTALL_DATE_KEY, PINNED_APPS_KEY, SETTINGS_KEY, STATS_KEY};
pub use service::SettingsService;
pub use types::{
    ApiSettings, ApiSource, AppsSettings, BackgroundSettings, BackgroundType, ClockSettings, ColorSettings,
    CycleTrigger, GradientSettings, GradientType, OrderPolicy, SettingsDocument, SettingsSection, StatsSettings,
    TimeFormat, UploadSettings,
};

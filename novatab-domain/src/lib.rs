//! Domain layer of the NovaTab new-tab dashboard.
//!
//! The dashboard is a settings document split into four sections (clock,
//! apps, background, stats), a synchronous change bus, and one feature module
//! per section. [`SettingsService`] is the only writer of the document; every
//! save publishes the new sections and each module re-applies its own.
//! Pinned apps and usage statistics live in their own stored documents.

// Re-export core module
pub use novatab_core as core;

pub mod bus;
pub mod dashboard;
pub mod error;
pub mod http;
pub mod modules;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use bus::{ChangeBus, ChangeHandler, SettingsChange, Topic};
pub use dashboard::{Dashboard, DashboardServices, DashboardSurfaces};
pub use error::{DomainError, DomainResult, NetworkError, ValidationError};
pub use modules::background::{BackgroundModule, BackgroundView, LoadKind};
pub use modules::clock::{ClockModule, ClockView};
pub use modules::pinned_apps::{AppDraft, AppsView, PinnedApp, PinnedAppsModule};
pub use modules::stats::{StatsData, StatsModule, StatsView, UsageSession};
pub use modules::{FeatureModule, Surface};
pub use settings::{SettingsDocument, SettingsRepository, SettingsService};

/// Starts a dashboard from the process configuration with the file-backed
/// store and HTTP collaborators.
pub async fn initialize(config: &core::CoreConfig, surfaces: DashboardSurfaces) -> DomainResult<Dashboard> {
    Dashboard::from_config(config, surfaces).await
}

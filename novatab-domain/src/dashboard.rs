//! Composition root.
//!
//! [`Dashboard`] owns the change bus, the settings service and the four
//! feature modules, and wires the store and outbound collaborators into them.

use std::path::PathBuf;
use std::sync::Arc;

use novatab_core::config::CoreConfig;
use novatab_core::store::{ConfigStore, FileConfigStore};
use novatab_core::utils::paths::get_app_data_dir;
use tracing::{info, warn};

use crate::bus::ChangeBus;
use crate::error::DomainResult;
use crate::http::build_client;
use crate::modules::background::{
    BackgroundModule, BackgroundView, HttpImageLoader, HttpImageSearchClient, ImageSources, LoadKind,
};
use crate::modules::clock::{ClockModule, ClockView};
use crate::modules::pinned_apps::{AppsView, FaviconProbe, HttpFaviconProbe, PinnedAppsModule};
use crate::modules::stats::{StatsModule, StatsView};
use crate::modules::surface::{NullSurface, Surface};
use crate::modules::FeatureModule;
use crate::modules::time::{SystemTimeProvider, TimeProvider};
use crate::settings::persistence::SettingsRepository;
use crate::settings::service::SettingsService;

/// Subdirectory of the application data dir holding the stored documents.
pub const STORE_DIR_NAME: &str = "store";

/// Outbound collaborators handed to the modules.
#[derive(Clone)]
pub struct DashboardServices {
    pub images: ImageSources,
    pub favicon: Option<Arc<dyn FaviconProbe>>,
    pub time: Arc<dyn TimeProvider>,
}

impl DashboardServices {
    /// No network access: API backgrounds fall back to color and favicons
    /// are never probed.
    pub fn offline() -> Self {
        Self { images: ImageSources::default(), favicon: None, time: Arc::new(SystemTimeProvider) }
    }

    /// HTTP image search, image preload and favicon probing sharing one client.
    pub fn from_config(config: &CoreConfig) -> DomainResult<Self> {
        let client = build_client(&config.network)?;
        Ok(Self {
            images: ImageSources {
                search: Some(Arc::new(HttpImageSearchClient::new(client.clone(), &config.images))),
                loader: Arc::new(HttpImageLoader::new(client.clone())),
                batch_size: config.images.batch_size,
            },
            favicon: Some(Arc::new(HttpFaviconProbe::new(client))),
            time: Arc::new(SystemTimeProvider),
        })
    }
}

/// Where each module presents its view.
#[derive(Clone)]
pub struct DashboardSurfaces {
    pub clock: Arc<dyn Surface<ClockView>>,
    pub apps: Arc<dyn Surface<AppsView>>,
    pub background: Arc<dyn Surface<BackgroundView>>,
    pub stats: Arc<dyn Surface<StatsView>>,
}

impl Default for DashboardSurfaces {
    fn default() -> Self {
        Self {
            clock: Arc::new(NullSurface),
            apps: Arc::new(NullSurface),
            background: Arc::new(NullSurface),
            stats: Arc::new(NullSurface),
        }
    }
}

pub struct Dashboard {
    bus: Arc<ChangeBus>,
    repository: Arc<SettingsRepository>,
    settings: SettingsService,
    clock: Arc<ClockModule>,
    apps: Arc<PinnedAppsModule>,
    background: Arc<BackgroundModule>,
    stats: Arc<StatsModule>,
}

impl Dashboard {
    /// Starts every module against `store`. Storage failures degrade to
    /// defaults, so this never fails.
    pub async fn initialize(
        store: Arc<dyn ConfigStore>,
        services: DashboardServices,
        surfaces: DashboardSurfaces,
    ) -> Self {
        let bus = Arc::new(ChangeBus::new());
        let repository = Arc::new(SettingsRepository::new(store));
        let settings = SettingsService::new(repository.clone(), bus.clone());
        settings.load().await;

        let clock = ClockModule::start(&repository, &bus, services.time.clone(), surfaces.clock).await;
        let apps = PinnedAppsModule::start(repository.clone(), &bus, services.favicon, surfaces.apps).await;
        let background =
            BackgroundModule::start(repository.clone(), &bus, services.images, surfaces.background).await;
        let stats = StatsModule::start(repository.clone(), &bus, services.time, surfaces.stats).await;
        stats.on_focus();

        info!(
            clock = bus.subscriber_count(clock.topic()),
            apps = bus.subscriber_count(apps.topic()),
            background = bus.subscriber_count(background.topic()),
            stats = bus.subscriber_count(stats.topic()),
            "dashboard initialized"
        );
        Self { bus, repository, settings, clock, apps, background, stats }
    }

    /// Opens the file-backed store from `config.storage` (or the application
    /// data dir) and uses HTTP collaborators.
    pub async fn from_config(config: &CoreConfig, surfaces: DashboardSurfaces) -> DomainResult<Self> {
        let directory = store_directory(config)?;
        info!(directory = %directory.display(), "opening settings store");
        let store = FileConfigStore::open(directory)?;
        let services = DashboardServices::from_config(config)?;
        Ok(Self::initialize(Arc::new(store), services, surfaces).await)
    }

    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    pub fn repository(&self) -> &Arc<SettingsRepository> {
        &self.repository
    }

    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }

    pub fn clock(&self) -> &Arc<ClockModule> {
        &self.clock
    }

    pub fn apps(&self) -> &Arc<PinnedAppsModule> {
        &self.apps
    }

    pub fn background(&self) -> &Arc<BackgroundModule> {
        &self.background
    }

    pub fn stats(&self) -> &Arc<StatsModule> {
        &self.stats
    }

    /// A later load of the same page.
    pub async fn on_page_load(&self, load: LoadKind) -> BackgroundView {
        self.stats.on_focus();
        self.background.apply_background(load).await
    }

    /// Stops the timers and writes out the running usage session.
    pub async fn shutdown(&self) -> DomainResult<()> {
        self.clock.stop();
        let result = self.stats.shutdown().await;
        if let Err(e) = &result {
            warn!(error = %e, "usage session not saved on shutdown");
        }
        info!("dashboard shut down");
        result
    }
}

fn store_directory(config: &CoreConfig) -> DomainResult<PathBuf> {
    match &config.storage.directory {
        Some(directory) => Ok(directory.clone()),
        None => Ok(get_app_data_dir()?.join(STORE_DIR_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;
    use crate::error::{DomainError, ValidationError};
    use crate::modules::pinned_apps::AppDraft;
    use crate::modules::surface::RecordingSurface;
    use crate::modules::time::ManualTimeProvider;
    use crate::settings::persistence::{PINNED_APPS_KEY, SETTINGS_KEY};
    use crate::settings::types::{BackgroundType, TimeFormat};
    use chrono::{Local, TimeZone};
    use novatab_core::config::StorageConfig;
    use novatab_core::store::MemoryConfigStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    struct TestContext {
        store: Arc<MemoryConfigStore>,
        clock: Arc<RecordingSurface<ClockView>>,
        apps: Arc<RecordingSurface<AppsView>>,
        background: Arc<RecordingSurface<BackgroundView>>,
        stats: Arc<RecordingSurface<StatsView>>,
        dashboard: Dashboard,
    }

    async fn setup(store: MemoryConfigStore) -> TestContext {
        let store = Arc::new(store);
        let clock = Arc::new(RecordingSurface::new());
        let apps = Arc::new(RecordingSurface::new());
        let background = Arc::new(RecordingSurface::new());
        let stats = Arc::new(RecordingSurface::new());
        let surfaces = DashboardSurfaces {
            clock: clock.clone(),
            apps: apps.clone(),
            background: background.clone(),
            stats: stats.clone(),
        };
        let services = DashboardServices {
            time: Arc::new(ManualTimeProvider::new(Local.with_ymd_and_hms(2026, 2, 3, 8, 15, 0).unwrap())),
            ..DashboardServices::offline()
        };
        let dashboard = Dashboard::initialize(store.clone(), services, surfaces).await;
        TestContext { store, clock, apps, background, stats, dashboard }
    }

    #[tokio::test]
    async fn test_initialize_renders_every_module_from_defaults() {
        let ctx = setup(MemoryConfigStore::new()).await;

        assert_eq!(ctx.clock.last().unwrap().time, "08:15 AM");
        assert!(ctx.apps.last().unwrap().tiles.is_empty());
        assert_eq!(ctx.background.last(), Some(BackgroundView::Color { color: "#2d3436".into() }));
        assert!(!ctx.stats.last().unwrap().hidden);

        for topic in [Topic::Clock, Topic::Apps, Topic::Background, Topic::Stats] {
            assert_eq!(ctx.dashboard.bus().subscriber_count(topic), 1);
        }
    }

    #[tokio::test]
    async fn test_saved_settings_reach_every_module() {
        let ctx = setup(MemoryConfigStore::new()).await;
        let clock_renders = ctx.clock.count();

        ctx.dashboard
            .settings()
            .edit(|doc| {
                doc.clock.format = TimeFormat::TwentyFourHour;
                doc.apps.show_names = false;
                doc.background.kind = BackgroundType::Gradient;
                doc.stats.show_days_used = false;
            })
            .await;
        ctx.dashboard.settings().save().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(ctx.clock.count(), clock_renders + 1);
        assert_eq!(ctx.clock.last().unwrap().time, "08:15");
        assert!(!ctx.dashboard.apps().get_settings().show_names);
        assert!(matches!(ctx.background.last(), Some(BackgroundView::Gradient { .. })));
        assert_eq!(ctx.stats.last().unwrap().days_used, None);

        let stored = ctx.store.get(SETTINGS_KEY).await.unwrap().unwrap();
        assert_eq!(stored["clock"]["format"], json!("24"));
    }

    #[tokio::test]
    async fn test_import_missing_apps_leaves_store_untouched() {
        let before = json!({ "clock": { "format": "24" }, "apps": {}, "background": {}, "stats": {} });
        let ctx = setup(MemoryConfigStore::with_entries([(SETTINGS_KEY, before.clone())])).await;

        let result = ctx
            .dashboard
            .settings()
            .import_json(r#"{ "clock": {}, "background": {}, "stats": {} }"#)
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::MissingSection(ref key))) if key == "apps"
        ));
        assert_eq!(ctx.store.get(SETTINGS_KEY).await.unwrap(), Some(before));
    }

    #[tokio::test]
    async fn test_pinned_apps_round_trip_through_a_restart() {
        let ctx = setup(MemoryConfigStore::new()).await;
        let apps = ctx.dashboard.apps();
        apps.add(AppDraft::new("Mail", "https://mail.example.com")).await.unwrap();
        apps.add(AppDraft::new("Docs", "https://docs.example.com").with_icon("data:image/png;base64,AAAA"))
            .await
            .unwrap();
        let saved = apps.apps();
        ctx.dashboard.shutdown().await.unwrap();

        let stored = ctx.store.get(PINNED_APPS_KEY).await.unwrap().unwrap();
        let restarted = setup(MemoryConfigStore::with_entries([(PINNED_APPS_KEY, stored)])).await;
        assert_eq!(restarted.dashboard.apps().apps(), saved);
    }

    #[tokio::test]
    async fn test_shutdown_stops_timers() {
        let ctx = setup(MemoryConfigStore::new()).await;
        assert!(ctx.dashboard.clock().tick_period().is_some());
        assert!(ctx.dashboard.stats().is_sampling());

        ctx.dashboard.shutdown().await.unwrap();

        assert_eq!(ctx.dashboard.clock().tick_period(), None);
        assert!(!ctx.dashboard.stats().is_sampling());
    }

    #[tokio::test]
    async fn test_page_load_reapplies_background() {
        let ctx = setup(MemoryConfigStore::new()).await;
        let renders = ctx.background.count();
        let view = ctx.dashboard.on_page_load(LoadKind::Reload).await;
        assert_eq!(view, BackgroundView::Color { color: "#2d3436".into() });
        assert_eq!(ctx.background.count(), renders + 1);
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_store_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            storage: StorageConfig { directory: Some(dir.path().join("novatab")) },
            ..Default::default()
        };

        let dashboard = Dashboard::from_config(&config, DashboardSurfaces::default()).await.unwrap();
        dashboard.settings().save().await.unwrap();
        dashboard.shutdown().await.unwrap();

        assert!(dir.path().join("novatab").is_dir());
        let reopened = FileConfigStore::open(dir.path().join("novatab")).unwrap();
        assert!(reopened.get(SETTINGS_KEY).await.unwrap().is_some());
    }
}

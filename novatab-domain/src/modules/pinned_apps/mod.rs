//! The pinned-app grid.
//!
//! Apps are kept in grid order and addressed by their stable [`Uuid`], so a
//! reorder never depends on positions captured before the user started
//! dragging. Every mutation re-renders immediately and then persists the
//! whole list under `pinnedApps`. Invalid input is rejected before anything
//! changes. A failed write is returned to the caller but the in-memory change
//! stands, and the next successful write carries it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::Map;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::surface::Surface;
use super::{FeatureModule, SectionState};
use crate::bus::ChangeBus;
use crate::error::{DomainError, DomainResult, ValidationError};
use crate::settings::persistence::SettingsRepository;
use crate::settings::types::AppsSettings;

pub mod favicon;
pub mod types;

pub use favicon::{favicon_url, FaviconProbe, HttpFaviconProbe};
pub use types::{placeholder_glyph, AppDraft, AppTile, AppsView, PinnedApp, TileIcon, ValidatedDraft};

pub struct PinnedAppsModule {
    settings: SectionState<AppsSettings>,
    apps: Mutex<Vec<PinnedApp>>,
    broken_icons: Mutex<HashSet<Uuid>>,
    repository: Arc<SettingsRepository>,
    favicon: Option<Arc<dyn FaviconProbe>>,
    surface: Arc<dyn Surface<AppsView>>,
}

impl PinnedAppsModule {
    pub async fn start(
        repository: Arc<SettingsRepository>,
        bus: &ChangeBus,
        favicon: Option<Arc<dyn FaviconProbe>>,
        surface: Arc<dyn Surface<AppsView>>,
    ) -> Arc<Self> {
        let settings: AppsSettings = repository.load_section().await;
        let apps = repository.load_pinned_apps().await;
        debug!(count = apps.len(), "pinned apps loaded");

        let module = Arc::new(Self {
            settings: SectionState::new(settings),
            apps: Mutex::new(apps),
            broken_icons: Mutex::new(HashSet::new()),
            repository,
            favicon,
            surface,
        });
        module.render();

        let weak = Arc::downgrade(&module);
        bus.subscribe_section::<AppsSettings, _>(move |incoming| {
            if let Some(module) = weak.upgrade() {
                module.settings.merge(incoming);
                module.render();
            }
        });
        module
    }

    /// The apps in grid order.
    pub fn apps(&self) -> Vec<PinnedApp> {
        self.lock_apps().clone()
    }

    /// Appends a new app and returns its id.
    pub async fn add(&self, draft: AppDraft) -> DomainResult<Uuid> {
        let validated = draft.validate()?;
        let icon = self.resolve_icon(&validated).await;
        let app = PinnedApp {
            id: Uuid::new_v4(),
            name: validated.name,
            url: validated.url.to_string(),
            icon,
            extra: Map::new(),
        };
        let id = app.id;
        info!(%id, name = %app.name, "pinned app added");
        self.commit(|apps| {
            apps.push(app);
            Ok(())
        })
        .await?;
        Ok(id)
    }

    /// Replaces name, URL and icon of the app with `id`, keeping its position.
    pub async fn update(&self, id: Uuid, draft: AppDraft) -> DomainResult<()> {
        let validated = draft.validate()?;
        if !self.lock_apps().iter().any(|app| app.id == id) {
            return Err(DomainError::AppNotFound(id));
        }
        let icon = self.resolve_icon(&validated).await;
        self.broken_icons
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id);

        self.commit(|apps| {
            let app = apps
                .iter_mut()
                .find(|app| app.id == id)
                .ok_or(DomainError::AppNotFound(id))?;
            app.name = validated.name;
            app.url = validated.url.to_string();
            app.icon = icon;
            Ok(())
        })
        .await
    }

    pub async fn remove(&self, id: Uuid) -> DomainResult<PinnedApp> {
        let mut removed = None;
        self.commit(|apps| {
            let index = position_of(apps, id)?;
            removed = Some(apps.remove(index));
            Ok(())
        })
        .await?;
        removed.ok_or(DomainError::AppNotFound(id))
    }

    /// Moves the app with `id` so that it ends up at `target` (clamped to the
    /// end of the list).
    pub async fn move_to(&self, id: Uuid, target: usize) -> DomainResult<()> {
        self.commit(|apps| {
            let from = position_of(apps, id)?;
            let app = apps.remove(from);
            let to = target.min(apps.len());
            apps.insert(to, app);
            Ok(())
        })
        .await
    }

    /// Rearranges the grid into `order`, which must name every current app
    /// exactly once.
    pub async fn reorder(&self, order: &[Uuid]) -> DomainResult<()> {
        self.commit(|apps| {
            if order.len() != apps.len() {
                return Err(ValidationError::UnknownOrdering(format!(
                    "expected {} ids, got {}",
                    apps.len(),
                    order.len()
                ))
                .into());
            }
            let mut remaining: Vec<Option<PinnedApp>> = apps.drain(..).map(Some).collect();
            let mut reordered = Vec::with_capacity(order.len());
            for id in order {
                let slot = remaining.iter_mut().find(|slot| matches!(slot, Some(app) if app.id == *id));
                match slot.and_then(Option::take) {
                    Some(app) => reordered.push(app),
                    None => {
                        // Restore the original order before bailing out.
                        apps.extend(reordered.into_iter().chain(remaining.into_iter().flatten()));
                        return Err(ValidationError::UnknownOrdering(format!("unknown or repeated id {}", id)).into());
                    }
                }
            }
            *apps = reordered;
            Ok(())
        })
        .await
    }

    /// Records that the icon of `id` failed to load; the tile falls back to
    /// its placeholder glyph.
    pub fn mark_icon_failed(&self, id: Uuid) {
        let inserted = self
            .broken_icons
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id);
        if inserted {
            warn!(%id, "app icon failed to load; using placeholder");
            self.render();
        }
    }

    async fn resolve_icon(&self, draft: &ValidatedDraft) -> String {
        if let Some(icon) = &draft.icon {
            return icon.clone();
        }
        let Some(probe) = &self.favicon else {
            return String::new();
        };
        match probe.probe(&draft.url).await {
            Ok(icon) => icon,
            Err(e) => {
                debug!(url = %draft.url, error = %e, "could not load favicon");
                String::new()
            }
        }
    }

    /// Applies `mutation` to the list; on success re-renders and persists.
    /// A rejected mutation must leave the list as it found it.
    async fn commit<F>(&self, mutation: F) -> DomainResult<()>
    where
        F: FnOnce(&mut Vec<PinnedApp>) -> DomainResult<()>,
    {
        let snapshot = {
            let mut apps = self.lock_apps();
            mutation(&mut apps)?;
            apps.clone()
        };
        self.render();
        if let Err(e) = self.repository.save_pinned_apps(&snapshot).await {
            warn!(error = %e, "failed to persist pinned apps");
            return Err(e);
        }
        Ok(())
    }

    fn lock_apps(&self) -> std::sync::MutexGuard<'_, Vec<PinnedApp>> {
        self.apps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn view(&self) -> AppsView {
        let settings = self.settings.get();
        let apps = self.lock_apps().clone();
        let broken = self
            .broken_icons
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        let capacity = (settings.grid_columns as usize).saturating_mul(settings.grid_rows as usize);
        let overflow = apps.len().saturating_sub(capacity);
        let tiles = apps
            .into_iter()
            .take(capacity)
            .map(|app| {
                let icon = if app.icon.is_empty() || broken.contains(&app.id) {
                    TileIcon::Placeholder(placeholder_glyph(&app.name))
                } else {
                    TileIcon::Image(app.icon)
                };
                AppTile {
                    id: app.id,
                    label: settings.show_names.then_some(app.name),
                    url: app.url,
                    icon,
                }
            })
            .collect();

        AppsView {
            tiles,
            overflow,
            columns: settings.grid_columns,
            padding_px: settings.padding,
            opacity: settings.transparency.clamp(0.0, 1.0),
        }
    }
}

fn position_of(apps: &[PinnedApp], id: Uuid) -> DomainResult<usize> {
    apps.iter()
        .position(|app| app.id == id)
        .ok_or(DomainError::AppNotFound(id))
}

impl FeatureModule for PinnedAppsModule {
    type Settings = AppsSettings;
    type View = AppsView;

    fn get_settings(&self) -> AppsSettings {
        self.settings.get()
    }

    fn render(&self) -> AppsView {
        let view = self.view();
        debug!(tiles = view.tiles.len(), overflow = view.overflow, "render pinned apps");
        self.surface.present(&view);
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SettingsChange;
    use crate::error::NetworkError;
    use crate::modules::surface::RecordingSurface;
    use crate::settings::persistence::PINNED_APPS_KEY;
    use crate::test_support::{MockFavicon, MockStore};
    use novatab_core::store::{ConfigStore, MemoryConfigStore};
    use novatab_core::StoreError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct TestContext {
        store: Arc<MemoryConfigStore>,
        bus: ChangeBus,
        surface: Arc<RecordingSurface<AppsView>>,
        module: Arc<PinnedAppsModule>,
    }

    async fn setup(favicon: Option<Arc<dyn FaviconProbe>>) -> TestContext {
        let store = Arc::new(MemoryConfigStore::new());
        let bus = ChangeBus::new();
        let surface = Arc::new(RecordingSurface::new());
        let repository = Arc::new(SettingsRepository::new(store.clone()));
        let module = PinnedAppsModule::start(repository, &bus, favicon, surface.clone()).await;
        TestContext { store, bus, surface, module }
    }

    fn names(module: &PinnedAppsModule) -> Vec<String> {
        module.apps().into_iter().map(|app| app.name).collect()
    }

    #[tokio::test]
    async fn test_add_appends_persists_and_renders() {
        let ctx = setup(None).await;
        ctx.module.add(AppDraft::new("Mail", "https://mail.example.com")).await.unwrap();
        ctx.module
            .add(AppDraft::new("Docs", "https://docs.example.com").with_icon("data:image/png;base64,AAAA"))
            .await
            .unwrap();

        assert_eq!(names(&ctx.module), vec!["Mail", "Docs"]);
        let stored = ctx.store.get(PINNED_APPS_KEY).await.unwrap().unwrap();
        assert_eq!(stored[1]["icon"], json!("data:image/png;base64,AAAA"));

        let view = ctx.surface.last().unwrap();
        assert_eq!(view.tiles[0].icon, TileIcon::Placeholder('M'));
        assert_eq!(view.tiles[1].icon, TileIcon::Image("data:image/png;base64,AAAA".into()));
    }

    #[tokio::test]
    async fn test_list_writes_keep_unknown_app_fields() {
        let stored = json!([{ "name": "Mail", "url": "https://mail.example.com/", "folder": "work" }]);
        let store = Arc::new(MemoryConfigStore::with_entries([(PINNED_APPS_KEY, stored)]));
        let repository = Arc::new(SettingsRepository::new(store.clone()));
        let module =
            PinnedAppsModule::start(repository, &ChangeBus::new(), None, Arc::new(RecordingSurface::new())).await;

        module.add(AppDraft::new("Docs", "https://docs.example.com")).await.unwrap();

        let written = store.get(PINNED_APPS_KEY).await.unwrap().unwrap();
        assert_eq!(written[0]["folder"], json!("work"));
        assert_eq!(written[1].get("folder"), None);
    }

    #[tokio::test]
    async fn test_invalid_draft_changes_nothing() {
        let ctx = setup(None).await;
        let renders = ctx.surface.count();

        let err = ctx.module.add(AppDraft::new("Broken", "not a url")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ValidationError::InvalidUrl { .. })));
        assert!(ctx.module.apps().is_empty());
        assert_eq!(ctx.surface.count(), renders);
        assert_eq!(ctx.store.get(PINNED_APPS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let ctx = setup(None).await;
        ctx.module.add(AppDraft::new("A", "https://a.example.com")).await.unwrap();
        let b = ctx.module.add(AppDraft::new("B", "https://b.example.com")).await.unwrap();
        ctx.module.add(AppDraft::new("C", "https://c.example.com")).await.unwrap();

        ctx.module.update(b, AppDraft::new("Bee", "https://bee.example.com")).await.unwrap();
        assert_eq!(names(&ctx.module), vec!["A", "Bee", "C"]);
        assert_eq!(ctx.module.apps()[1].url, "https://bee.example.com/");

        let missing = ctx.module.update(Uuid::new_v4(), AppDraft::new("X", "https://x.example.com")).await;
        assert!(matches!(missing, Err(DomainError::AppNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_and_move() {
        let ctx = setup(None).await;
        let a = ctx.module.add(AppDraft::new("A", "https://a.example.com")).await.unwrap();
        ctx.module.add(AppDraft::new("B", "https://b.example.com")).await.unwrap();
        let c = ctx.module.add(AppDraft::new("C", "https://c.example.com")).await.unwrap();

        ctx.module.move_to(c, 0).await.unwrap();
        assert_eq!(names(&ctx.module), vec!["C", "A", "B"]);
        ctx.module.move_to(c, 99).await.unwrap();
        assert_eq!(names(&ctx.module), vec!["A", "B", "C"]);

        let removed = ctx.module.remove(a).await.unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(names(&ctx.module), vec!["B", "C"]);
        assert!(matches!(ctx.module.remove(a).await, Err(DomainError::AppNotFound(_))));
    }

    #[tokio::test]
    async fn test_reorder_by_ids() {
        let ctx = setup(None).await;
        let a = ctx.module.add(AppDraft::new("A", "https://a.example.com")).await.unwrap();
        let b = ctx.module.add(AppDraft::new("B", "https://b.example.com")).await.unwrap();
        let c = ctx.module.add(AppDraft::new("C", "https://c.example.com")).await.unwrap();

        ctx.module.reorder(&[c, a, b]).await.unwrap();
        assert_eq!(names(&ctx.module), vec!["C", "A", "B"]);

        let stored = ctx.store.get(PINNED_APPS_KEY).await.unwrap().unwrap();
        assert_eq!(stored[0]["name"], json!("C"));
    }

    #[tokio::test]
    async fn test_reorder_rejects_bad_permutations() {
        let ctx = setup(None).await;
        let a = ctx.module.add(AppDraft::new("A", "https://a.example.com")).await.unwrap();
        let b = ctx.module.add(AppDraft::new("B", "https://b.example.com")).await.unwrap();

        for order in [vec![a], vec![a, a], vec![a, Uuid::new_v4()]] {
            let result = ctx.module.reorder(&order).await;
            assert!(matches!(
                result,
                Err(DomainError::Validation(ValidationError::UnknownOrdering(_)))
            ));
            assert_eq!(ctx.module.apps().iter().map(|app| app.id).collect::<Vec<_>>(), vec![a, b]);
        }
    }

    #[tokio::test]
    async fn test_favicon_probe_fills_missing_icon() {
        let mut probe = MockFavicon::new();
        probe.expect_probe().times(2).returning(|page| match page.host_str() {
            Some("mail.example.com") => Ok("https://mail.example.com/favicon.ico".to_string()),
            _ => Err(NetworkError::Status { status: 404, url: page.to_string() }),
        });

        let ctx = setup(Some(Arc::new(probe))).await;
        ctx.module.add(AppDraft::new("Mail", "https://mail.example.com")).await.unwrap();
        ctx.module.add(AppDraft::new("Wiki", "https://wiki.example.com")).await.unwrap();

        let apps = ctx.module.apps();
        assert_eq!(apps[0].icon, "https://mail.example.com/favicon.ico");
        assert_eq!(apps[1].icon, "");
    }

    #[tokio::test]
    async fn test_icon_failure_renders_placeholder() {
        let ctx = setup(None).await;
        let id = ctx
            .module
            .add(AppDraft::new("search", "https://search.example.com").with_icon("https://cdn.example.com/s.png"))
            .await
            .unwrap();

        ctx.module.mark_icon_failed(id);
        assert_eq!(ctx.surface.last().unwrap().tiles[0].icon, TileIcon::Placeholder('S'));
    }

    #[tokio::test]
    async fn test_view_respects_grid_and_settings_changes() {
        let ctx = setup(None).await;
        for i in 0..5 {
            ctx.module
                .add(AppDraft::new(format!("App {i}"), format!("https://app{i}.example.com")))
                .await
                .unwrap();
        }

        ctx.bus.publish(SettingsChange::Apps(AppsSettings {
            grid_columns: 2,
            grid_rows: 2,
            show_names: false,
            transparency: 1.7,
            ..Default::default()
        }));

        let view = ctx.surface.last().unwrap();
        assert_eq!(view.tiles.len(), 4);
        assert_eq!(view.overflow, 1);
        assert_eq!(view.tiles[0].label, None);
        assert_eq!(view.opacity, 1.0);
        assert_eq!(ctx.module.get_settings().grid_columns, 2);
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported_but_change_kept() {
        let mut store = MockStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .returning(|key, _| Err(StoreError::Backend { key: key.to_string(), message: "quota".into() }));
        let bus = ChangeBus::new();
        let repository = Arc::new(SettingsRepository::new(Arc::new(store)));
        let module = PinnedAppsModule::start(repository, &bus, None, Arc::new(RecordingSurface::new())).await;

        let result = module.add(AppDraft::new("Mail", "https://mail.example.com")).await;
        assert!(matches!(result, Err(DomainError::Storage(_))));
        assert_eq!(names(&module), vec!["Mail"]);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips_order_and_fields() {
        let ctx = setup(None).await;
        ctx.module.add(AppDraft::new("Zed", "https://zed.example.com")).await.unwrap();
        ctx.module.add(AppDraft::new("Alpha", "https://alpha.example.com").with_icon("https://i/a.png")).await.unwrap();
        ctx.module.add(AppDraft::new("Zed", "https://zed.example.com")).await.unwrap();

        let reloaded = SettingsRepository::new(ctx.store.clone()).load_pinned_apps().await;
        assert_eq!(reloaded, ctx.module.apps());
    }
}

//! Page background.
//!
//! `color` and `gradient` render directly. `upload` and `api` pick an image
//! from their pool with [`selector`], preload it through an [`ImageLoader`]
//! and only then show it. Whenever no image can be shown (empty pool,
//! missing API key, failed fetch, failed load) the solid color is used.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::surface::Surface;
use super::{FeatureModule, SectionState};
use crate::bus::ChangeBus;
use crate::error::{DomainError, DomainResult, NetworkError};
use crate::settings::persistence::SettingsRepository;
use crate::settings::types::{
    ApiSettings, BackgroundSettings, BackgroundType, CycleTrigger, GradientSettings, GradientType, OrderPolicy,
    UploadSettings,
};

pub mod image_api;
pub mod preload;
pub mod selector;

pub use image_api::{HttpImageSearchClient, ImageSearchClient};
pub use preload::{HttpImageLoader, ImageLoader, PassthroughImageLoader};
pub use selector::{select_next, Selection};

/// Why the background is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// A freshly opened tab.
    NewTab,
    /// The same tab reloaded.
    Reload,
    /// Background settings were saved.
    SettingsChanged,
}

impl LoadKind {
    fn advances(self, cycle: CycleTrigger) -> bool {
        match self {
            LoadKind::NewTab => true,
            LoadKind::Reload => cycle == CycleTrigger::Refresh,
            LoadKind::SettingsChanged => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundView {
    Image { uri: String, crossfade: bool },
    Color { color: String },
    Gradient { css: String },
}

/// CSS for a two-stop gradient.
///
/// ```
/// use novatab_domain::modules::background::gradient_css;
/// use novatab_domain::settings::GradientSettings;
///
/// assert_eq!(
///     gradient_css(&GradientSettings::default()),
///     "linear-gradient(135deg, #667eea 0%, #764ba2 100%)"
/// );
/// ```
pub fn gradient_css(gradient: &GradientSettings) -> String {
    match gradient.kind {
        GradientType::Linear => format!("linear-gradient(135deg, {} 0%, {} 100%)", gradient.color1, gradient.color2),
        GradientType::Radial => format!("radial-gradient(circle, {} 0%, {} 100%)", gradient.color1, gradient.color2),
    }
}

/// Where API-mode images come from and how they are checked before display.
#[derive(Clone)]
pub struct ImageSources {
    pub search: Option<Arc<dyn ImageSearchClient>>,
    pub loader: Arc<dyn ImageLoader>,
    /// Number of URLs requested per fetch.
    pub batch_size: u32,
}

impl Default for ImageSources {
    fn default() -> Self {
        Self { search: None, loader: Arc::new(PassthroughImageLoader), batch_size: 30 }
    }
}

pub struct BackgroundModule {
    settings: SectionState<BackgroundSettings>,
    repository: Arc<SettingsRepository>,
    sources: ImageSources,
    rng: Mutex<StdRng>,
    current: Mutex<BackgroundView>,
    surface: Arc<dyn Surface<BackgroundView>>,
}

impl BackgroundModule {
    /// Loads the background section, applies it as a new-tab load and
    /// subscribes to background changes.
    pub async fn start(
        repository: Arc<SettingsRepository>,
        bus: &ChangeBus,
        sources: ImageSources,
        surface: Arc<dyn Surface<BackgroundView>>,
    ) -> Arc<Self> {
        Self::start_with_rng(repository, bus, sources, surface, StdRng::from_entropy()).await
    }

    pub async fn start_with_rng(
        repository: Arc<SettingsRepository>,
        bus: &ChangeBus,
        sources: ImageSources,
        surface: Arc<dyn Surface<BackgroundView>>,
        rng: StdRng,
    ) -> Arc<Self> {
        let settings: BackgroundSettings = repository.load_section().await;
        let initial = color_view(&settings);
        let module = Arc::new(Self {
            settings: SectionState::new(settings),
            repository,
            sources,
            rng: Mutex::new(rng),
            current: Mutex::new(initial),
            surface,
        });
        module.apply_background(LoadKind::NewTab).await;

        let weak = Arc::downgrade(&module);
        bus.subscribe_section::<BackgroundSettings, _>(move |incoming| {
            if let Some(module) = weak.upgrade() {
                module.on_settings_changed(incoming);
            }
        });
        module
    }

    fn on_settings_changed(self: &Arc<Self>, incoming: &BackgroundSettings) {
        let (previous, merged) = self.settings.merge(incoming);
        if api_query_changed(&previous.api, &merged.api) {
            debug!("image search changed; dropping cached API images");
            self.settings.update(|s| {
                s.api.images.clear();
                s.api.current_index = 0;
            });
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime; background not re-applied");
            return;
        };
        let weak = Arc::downgrade(self);
        runtime.spawn(async move {
            if let Some(module) = weak.upgrade() {
                module.apply_background(LoadKind::SettingsChanged).await;
            }
        });
    }

    /// Resolves and presents the background for `load`.
    pub async fn apply_background(&self, load: LoadKind) -> BackgroundView {
        let settings = self.settings.get();
        let view = match settings.kind {
            BackgroundType::Color => color_view(&settings),
            BackgroundType::Gradient => BackgroundView::Gradient { css: gradient_css(&settings.gradient) },
            BackgroundType::Upload | BackgroundType::Api => match self.resolve_image(&settings, load).await {
                Ok(uri) => {
                    let crossfade = matches!(
                        &*self.lock_current(),
                        BackgroundView::Image { uri: shown, .. } if *shown != uri
                    );
                    BackgroundView::Image { uri, crossfade }
                }
                Err(e) => {
                    warn!(mode = ?settings.kind, error = %e, "falling back to color background");
                    color_view(&settings)
                }
            },
        };

        *self.lock_current() = view.clone();
        self.surface.present(&view);
        view
    }

    async fn resolve_image(&self, settings: &BackgroundSettings, load: LoadKind) -> DomainResult<String> {
        let uri = match settings.kind {
            BackgroundType::Upload => self.next_upload_image(&settings.upload, load).await?,
            BackgroundType::Api => self.next_api_image(&settings.api, load).await?,
            BackgroundType::Color | BackgroundType::Gradient => return Err(DomainError::NoImageAvailable),
        };
        self.sources.loader.preload(&uri).await?;
        Ok(uri)
    }

    async fn next_upload_image(&self, upload: &UploadSettings, load: LoadKind) -> DomainResult<String> {
        let picked = if load.advances(upload.cycle) {
            let mut rng = self.lock_rng();
            select_next(&upload.images, upload.order, upload.current_index, &mut *rng)
        } else {
            selector::current(&upload.images, upload.current_index)
        }
        .map(|selection| (selection.image.to_string(), selection.next_cursor));

        let (image, next_cursor) = picked.ok_or(DomainError::NoImageAvailable)?;
        if next_cursor != upload.current_index {
            self.persist_pool(move |background| background.upload.current_index = next_cursor)
                .await;
        }
        Ok(image)
    }

    async fn next_api_image(&self, api: &ApiSettings, load: LoadKind) -> DomainResult<String> {
        let mut images = api.images.clone();
        let mut cursor = api.current_index;

        if images.is_empty() {
            if api.api_key.trim().is_empty() {
                return Err(NetworkError::MissingApiKey(api.source).into());
            }
            let search = self.sources.search.as_ref().ok_or(DomainError::NoImageAvailable)?;
            images = search
                .fetch_batch(api.source, &api.api_key, &api.query, self.sources.batch_size)
                .await?;
            if images.is_empty() {
                return Err(DomainError::NoImageAvailable);
            }
            info!(source = ?api.source, count = images.len(), "cached new API images");
            cursor = 0;
            let cached = images.clone();
            self.persist_pool(move |background| {
                background.api.images = cached.clone();
                background.api.current_index = 0;
            })
            .await;
        }

        let picked = if load.advances(CycleTrigger::Refresh) {
            let mut rng = self.lock_rng();
            select_next(&images, OrderPolicy::Sequential, cursor, &mut *rng)
        } else {
            selector::current(&images, cursor)
        }
        .map(|selection| (selection.image.to_string(), selection.next_cursor));

        let (image, next_cursor) = picked.ok_or(DomainError::NoImageAvailable)?;
        if next_cursor != cursor {
            self.persist_pool(move |background| background.api.current_index = next_cursor)
                .await;
        }
        Ok(image)
    }

    /// Applies a pool bookkeeping change in memory and in the stored
    /// document, without a change notification. A failed write is logged.
    async fn persist_pool<F>(&self, update: F)
    where
        F: Fn(&mut BackgroundSettings) + Send + Sync,
    {
        self.settings.update(|settings| update(settings));
        if let Err(e) = self
            .repository
            .update_document(|document| update(&mut document.background))
            .await
        {
            warn!(error = %e, "failed to persist background pool state");
        }
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, BackgroundView> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn color_view(settings: &BackgroundSettings) -> BackgroundView {
    BackgroundView::Color { color: settings.color.color.clone() }
}

fn api_query_changed(previous: &ApiSettings, current: &ApiSettings) -> bool {
    previous.source != current.source || previous.query != current.query || previous.api_key != current.api_key
}

impl FeatureModule for BackgroundModule {
    type Settings = BackgroundSettings;
    type View = BackgroundView;

    fn get_settings(&self) -> BackgroundSettings {
        self.settings.get()
    }

    /// Presents the background last applied; choosing a new image happens in
    /// [`BackgroundModule::apply_background`].
    fn render(&self) -> BackgroundView {
        let view = self.lock_current().clone();
        self.surface.present(&view);
        view
    }
}

//! Usage statistics.
//!
//! While enabled, a one-second sampler credits active time (focused and not
//! idle) to today's and the lifetime totals. Losing focus or shutting down
//! closes the running session and appends it to the 30-day session log.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, warn};

use super::surface::Surface;
use super::time::TimeProvider;
use super::timer::RepeatingTimer;
use super::{FeatureModule, SectionState};
use crate::bus::ChangeBus;
use crate::error::DomainResult;
use crate::settings::persistence::SettingsRepository;
use crate::settings::types::StatsSettings;

pub mod tracker;
pub mod types;

pub use tracker::{ActivityTracker, EndedSession, IDLE_THRESHOLD};
pub use types::{StatsData, UsageSession, SESSION_RETENTION_DAYS};

pub const SAMPLE_CADENCE: Duration = Duration::from_millis(1000);

/// Accrued seconds kept in memory before the totals are written out.
pub const FLUSH_EVERY_SECS: u64 = 60;

/// "2h 5m"
pub fn format_duration(secs: u64) -> String {
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

/// Local calendar days from install to `now`, counting both ends.
pub fn days_used(install_date: DateTime<Utc>, now: DateTime<Local>) -> u64 {
    let installed_on = install_date.with_timezone(&Local).date_naive();
    let days = (now.date_naive() - installed_on).num_days().max(0);
    days as u64 + 1
}

fn day_key(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Each field is `None` when its `show*` flag is off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub hidden: bool,
    pub usage_today: Option<String>,
    pub tabs_today: Option<u32>,
    pub days_used: Option<u64>,
    pub trackers_blocked: Option<u64>,
}

#[derive(Debug, Default)]
struct Counters {
    data: StatsData,
    unsaved_secs: u64,
}

pub struct StatsModule {
    settings: SectionState<StatsSettings>,
    repository: Arc<SettingsRepository>,
    counters: Mutex<Counters>,
    tracker: Mutex<ActivityTracker>,
    install_date: DateTime<Utc>,
    time: Arc<dyn TimeProvider>,
    surface: Arc<dyn Surface<StatsView>>,
    timer: RepeatingTimer,
}

impl StatsModule {
    pub async fn start(
        repository: Arc<SettingsRepository>,
        bus: &ChangeBus,
        time: Arc<dyn TimeProvider>,
        surface: Arc<dyn Surface<StatsView>>,
    ) -> Arc<Self> {
        let settings: StatsSettings = repository.load_section().await;
        let data = repository.load_stats().await;
        let install_date = repository.install_date(time.now().with_timezone(&Utc)).await;

        let module = Arc::new(Self {
            settings: SectionState::new(settings),
            repository,
            counters: Mutex::new(Counters { data, unsaved_secs: 0 }),
            tracker: Mutex::new(ActivityTracker::new()),
            install_date,
            time,
            surface,
            timer: RepeatingTimer::new("stats"),
        });
        module.render();
        module.schedule();

        let weak = Arc::downgrade(&module);
        bus.subscribe_section::<StatsSettings, _>(move |incoming| {
            if let Some(module) = weak.upgrade() {
                module.apply(incoming);
            }
        });
        module
    }

    pub fn apply(self: &Arc<Self>, incoming: &StatsSettings) {
        let (previous, merged) = self.settings.merge(incoming);
        if previous.enabled != merged.enabled {
            info!(enabled = merged.enabled, "usage tracking toggled");
            self.schedule();
        }
        self.render();
    }

    fn enabled(&self) -> bool {
        self.settings.get().enabled
    }

    fn schedule(self: &Arc<Self>) {
        if !self.enabled() {
            self.timer.cancel();
            *self.lock_tracker() = ActivityTracker::new();
            return;
        }
        let weak = Arc::downgrade(self);
        self.timer.restart(SAMPLE_CADENCE, move || {
            let Some(module) = weak.upgrade() else { return };
            if let Some(snapshot) = module.sample() {
                tokio::spawn(async move {
                    if let Err(e) = module.repository.save_stats(&snapshot).await {
                        warn!(error = %e, "failed to persist usage statistics");
                    }
                });
            }
        });
    }

    /// Credits the time since the last sample. Returns a snapshot to persist
    /// once enough unsaved time has built up.
    pub(crate) fn sample(&self) -> Option<StatsData> {
        let now = self.time.now();
        let secs = {
            let mut tracker = self.lock_tracker();
            tracker.tick(now);
            tracker.take_elapsed_secs()
        };
        if secs == 0 {
            return None;
        }

        let snapshot = {
            let mut counters = self.lock_counters();
            counters.data.add_active_time(secs, &day_key(now));
            counters.unsaved_secs += secs;
            if counters.unsaved_secs < FLUSH_EVERY_SECS {
                None
            } else {
                counters.unsaved_secs = 0;
                counters.data.prune_sessions(now.with_timezone(&Utc));
                Some(counters.data.clone())
            }
        };
        self.render();
        snapshot
    }

    pub fn on_focus(&self) {
        if self.enabled() {
            self.lock_tracker().focus(self.time.now());
        }
    }

    pub fn on_input(&self) {
        if self.enabled() {
            self.lock_tracker().input(self.time.now());
        }
    }

    /// Closes the running session and persists the totals.
    pub async fn on_blur(&self) -> DomainResult<()> {
        if !self.enabled() {
            return Ok(());
        }
        self.finish_session().await
    }

    pub async fn on_tab_created(&self) -> DomainResult<()> {
        if !self.enabled() {
            return Ok(());
        }
        let now = self.time.now();
        self.lock_tracker().tab_created();
        let snapshot = {
            let mut counters = self.lock_counters();
            counters.data.record_tab(&day_key(now));
            counters.data.prune_sessions(now.with_timezone(&Utc));
            counters.data.clone()
        };
        debug!(tabs_today = snapshot.tabs_today, "tab recorded");
        self.render();
        self.repository.save_stats(&snapshot).await
    }

    /// Adds to the blocked-trackers counter reported by the host.
    pub async fn record_trackers_blocked(&self, count: u64) -> DomainResult<()> {
        if !self.enabled() || count == 0 {
            return Ok(());
        }
        let snapshot = {
            let mut counters = self.lock_counters();
            counters.data.trackers_blocked = counters.data.trackers_blocked.saturating_add(count);
            counters.data.prune_sessions(self.time.now().with_timezone(&Utc));
            counters.data.clone()
        };
        self.render();
        self.repository.save_stats(&snapshot).await
    }

    /// Stops sampling and writes out the final session.
    pub async fn shutdown(&self) -> DomainResult<()> {
        self.timer.cancel();
        self.finish_session().await
    }

    async fn finish_session(&self) -> DomainResult<()> {
        let now = self.time.now();
        let (secs, ended) = {
            let mut tracker = self.lock_tracker();
            let ended = tracker.end_session(now);
            (tracker.take_elapsed_secs(), ended)
        };

        let snapshot = {
            let mut counters = self.lock_counters();
            if secs > 0 {
                counters.data.add_active_time(secs, &day_key(now));
            }
            if let Some(ended) = ended {
                info!(duration_secs = ended.duration_secs, tabs = ended.tabs_opened, "usage session ended");
                counters.data.append_session(
                    UsageSession {
                        date: ended.started.with_timezone(&Utc),
                        duration: ended.duration_secs,
                        tabs_opened: ended.tabs_opened,
                    },
                    now.with_timezone(&Utc),
                );
            }
            counters.unsaved_secs = 0;
            counters.data.clone()
        };
        self.render();
        self.repository.save_stats(&snapshot).await
    }

    /// A copy of the in-memory statistics.
    pub fn data(&self) -> StatsData {
        self.lock_counters().data.clone()
    }

    pub fn is_sampling(&self) -> bool {
        self.timer.is_running()
    }

    pub fn view(&self) -> StatsView {
        let settings = self.settings.get();
        let now = self.time.now();
        let today = day_key(now);
        let counters = self.lock_counters();
        let data = &counters.data;
        StatsView {
            hidden: !settings.enabled,
            usage_today: settings.show_usage_time.then(|| format_duration(data.time_on(&today))),
            tabs_today: settings.show_tabs_opened.then(|| data.tabs_on(&today)),
            days_used: settings.show_days_used.then(|| days_used(self.install_date, now)),
            trackers_blocked: settings.show_trackers_blocked.then_some(data.trackers_blocked),
        }
    }

    fn lock_tracker(&self) -> std::sync::MutexGuard<'_, ActivityTracker> {
        self.tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_counters(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FeatureModule for StatsModule {
    type Settings = StatsSettings;
    type View = StatsView;

    fn get_settings(&self) -> StatsSettings {
        self.settings.get()
    }

    fn render(&self) -> StatsView {
        let view = self.view();
        self.surface.present(&view);
        view
    }
}

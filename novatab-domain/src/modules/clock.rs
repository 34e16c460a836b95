//! The clock widget.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Timelike};
use tracing::debug;

use super::surface::Surface;
use super::time::TimeProvider;
use super::timer::RepeatingTimer;
use super::{FeatureModule, SectionState};
use crate::bus::ChangeBus;
use crate::settings::persistence::SettingsRepository;
use crate::settings::types::{ClockSettings, TimeFormat};

pub const SECONDS_CADENCE: Duration = Duration::from_millis(1000);
pub const MINUTES_CADENCE: Duration = Duration::from_millis(60_000);

pub fn tick_interval(show_seconds: bool) -> Duration {
    if show_seconds {
        SECONDS_CADENCE
    } else {
        MINUTES_CADENCE
    }
}

/// Formats a time of day.
///
/// ```
/// use novatab_domain::modules::clock::format_time;
/// use novatab_domain::settings::TimeFormat;
///
/// assert_eq!(format_time(0, 7, 0, TimeFormat::TwelveHour, false), "12:07 AM");
/// assert_eq!(format_time(13, 7, 5, TimeFormat::TwelveHour, true), "01:07:05 PM");
/// assert_eq!(format_time(13, 7, 0, TimeFormat::TwentyFourHour, false), "13:07");
/// ```
pub fn format_time(hour: u32, minute: u32, second: u32, format: TimeFormat, show_seconds: bool) -> String {
    let (display_hour, suffix) = match format {
        TimeFormat::TwentyFourHour => (hour, None),
        TimeFormat::TwelveHour => {
            let suffix = if hour < 12 { "AM" } else { "PM" };
            let h = match hour % 12 {
                0 => 12,
                h => h,
            };
            (h, Some(suffix))
        }
    };

    let mut text = format!("{:02}:{:02}", display_hour, minute);
    if show_seconds {
        text.push_str(&format!(":{:02}", second));
    }
    if let Some(suffix) = suffix {
        text.push(' ');
        text.push_str(suffix);
    }
    text
}

/// "Monday, January 5"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockView {
    pub time: String,
    pub date: Option<String>,
    pub hidden: bool,
}

pub struct ClockModule {
    settings: SectionState<ClockSettings>,
    time: Arc<dyn TimeProvider>,
    surface: Arc<dyn Surface<ClockView>>,
    timer: RepeatingTimer,
}

impl ClockModule {
    /// Loads the clock section, renders once, starts ticking and subscribes
    /// to clock changes.
    pub async fn start(
        repository: &SettingsRepository,
        bus: &ChangeBus,
        time: Arc<dyn TimeProvider>,
        surface: Arc<dyn Surface<ClockView>>,
    ) -> Arc<Self> {
        let settings: ClockSettings = repository.load_section().await;
        let module = Arc::new(Self {
            settings: SectionState::new(settings),
            time,
            surface,
            timer: RepeatingTimer::new("clock"),
        });
        module.render();
        module.schedule();

        let weak = Arc::downgrade(&module);
        bus.subscribe_section::<ClockSettings, _>(move |incoming| {
            if let Some(module) = weak.upgrade() {
                module.apply(incoming);
            }
        });
        module
    }

    /// Merges a new clock section, reschedules on a cadence change and
    /// re-renders.
    pub fn apply(self: &Arc<Self>, incoming: &ClockSettings) {
        let (previous, merged) = self.settings.merge(incoming);
        if previous.show_seconds != merged.show_seconds || previous.hidden != merged.hidden {
            self.schedule();
        }
        self.render();
    }

    fn schedule(self: &Arc<Self>) {
        let settings = self.settings.get();
        if settings.hidden {
            self.timer.cancel();
            return;
        }
        let period = tick_interval(settings.show_seconds);
        let weak = Arc::downgrade(self);
        self.timer.restart(period, move || {
            if let Some(module) = weak.upgrade() {
                module.render();
            }
        });
    }

    /// Cadence of the running tick, `None` while hidden or stopped.
    pub fn tick_period(&self) -> Option<Duration> {
        self.timer.period()
    }

    pub fn stop(&self) {
        self.timer.cancel();
    }

    pub fn view(&self) -> ClockView {
        let settings = self.settings.get();
        let now = self.time.now();
        ClockView {
            time: format_time(now.hour(), now.minute(), now.second(), settings.format, settings.show_seconds),
            date: settings.show_date.then(|| format_date(now.date_naive())),
            hidden: settings.hidden,
        }
    }
}

impl FeatureModule for ClockModule {
    type Settings = ClockSettings;
    type View = ClockView;

    fn get_settings(&self) -> ClockSettings {
        self.settings.get()
    }

    fn render(&self) -> ClockView {
        let view = self.view();
        debug!(time = %view.time, "render clock");
        self.surface.present(&view);
        view
    }
}

//! Feature modules.
//!
//! Each module owns one section of the settings document. It loads that
//! section itself at start-up, renders a view to its [`Surface`], and
//! re-renders when the [`ChangeBus`](crate::bus::ChangeBus) reports a new
//! value for its section. Modules never read each other's state.

use std::sync::Mutex;

use crate::bus::Topic;
use crate::settings::merge::shallow_merge;
use crate::settings::types::SettingsSection;

pub mod background;
pub mod clock;
pub mod pinned_apps;
pub mod stats;
pub mod surface;
pub mod time;
pub mod timer;

pub use background::BackgroundModule;
pub use clock::ClockModule;
pub use pinned_apps::PinnedAppsModule;
pub use stats::StatsModule;
pub use surface::{NullSurface, RecordingSurface, Surface};
pub use time::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
pub use timer::RepeatingTimer;

/// Shape shared by the dashboard's feature modules.
pub trait FeatureModule: Send + Sync {
    type Settings: SettingsSection;
    type View: Clone + std::fmt::Debug;

    fn topic(&self) -> Topic {
        <Self::Settings as SettingsSection>::TOPIC
    }

    /// A copy of the module's current settings.
    fn get_settings(&self) -> Self::Settings;

    /// Builds the current view and presents it.
    fn render(&self) -> Self::View;
}

/// The in-memory copy of a module's section.
#[derive(Debug, Default)]
pub(crate) struct SectionState<S> {
    current: Mutex<S>,
}

impl<S: SettingsSection> SectionState<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self { current: Mutex::new(initial) }
    }

    pub(crate) fn get(&self) -> S {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Shallow-merges `incoming` and returns `(previous, merged)`.
    pub(crate) fn merge(&self, incoming: &S) -> (S, S) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let merged = shallow_merge(&*current, incoming);
        let previous = std::mem::replace(&mut *current, merged.clone());
        (previous, merged)
    }

    pub(crate) fn update<F: FnOnce(&mut S)>(&self, update: F) -> S {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut current);
        current.clone()
    }
}

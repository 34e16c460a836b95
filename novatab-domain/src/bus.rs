//! Synchronous, in-process change notification.
//!
//! Each [`Topic`] carries exactly one payload type; [`SettingsChange`] ties
//! the two together so a publisher cannot send a clock payload on the
//! background topic. Handlers run inline on the publishing task, in the order
//! they subscribed, before [`ChangeBus::publish`] returns. Nothing is queued:
//! a subscriber added after a publish never sees it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::settings::types::{AppsSettings, BackgroundSettings, ClockSettings, SettingsSection, StatsSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Clock,
    Apps,
    Background,
    Stats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsChange {
    Clock(ClockSettings),
    Apps(AppsSettings),
    Background(BackgroundSettings),
    Stats(StatsSettings),
}

impl SettingsChange {
    pub fn topic(&self) -> Topic {
        match self {
            SettingsChange::Clock(_) => Topic::Clock,
            SettingsChange::Apps(_) => Topic::Apps,
            SettingsChange::Background(_) => Topic::Background,
            SettingsChange::Stats(_) => Topic::Stats,
        }
    }
}

pub type ChangeHandler = Arc<dyn Fn(&SettingsChange) + Send + Sync>;

#[derive(Default)]
pub struct ChangeBus {
    handlers: RwLock<HashMap<Topic, Vec<ChangeHandler>>>,
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let counts: HashMap<&Topic, usize> = handlers.iter().map(|(t, h)| (t, h.len())).collect();
        f.debug_struct("ChangeBus").field("subscribers", &counts).finish()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `topic` for the lifetime of the bus.
    pub fn subscribe<F>(&self, topic: Topic, handler: F)
    where
        F: Fn(&SettingsChange) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        handlers.entry(topic).or_default().push(Arc::new(handler));
        debug!(?topic, "subscribed to settings changes");
    }

    /// Typed variant of [`subscribe`](Self::subscribe): the handler receives
    /// the section payload directly.
    pub fn subscribe_section<S, F>(&self, handler: F)
    where
        S: SettingsSection,
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.subscribe(S::TOPIC, move |change| {
            if let Some(section) = S::from_change(change) {
                handler(section);
            }
        });
    }

    /// Delivers `change` to every current subscriber of its topic and returns
    /// how many handlers ran.
    pub fn publish(&self, change: SettingsChange) -> usize {
        let topic = change.topic();
        // Snapshot so handlers may subscribe without deadlocking.
        let handlers: Vec<ChangeHandler> = {
            let guard = self.handlers.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.get(&topic).cloned().unwrap_or_default()
        };
        for handler in &handlers {
            handler(&change);
        }
        trace!(?topic, delivered = handlers.len(), "published settings change");
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        handlers.get(&topic).map_or(0, Vec::len)
    }
}

//! Active-time accounting.

use std::time::Duration;

use chrono::{DateTime, Local};

/// Input older than this makes the user idle.
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(30);

/// Totals of a session that just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndedSession {
    pub started: DateTime<Local>,
    pub duration_secs: u64,
    pub tabs_opened: u32,
}

/// Tracks focus and input, accruing time only while focused and not idle.
///
/// Time is sampled by [`tick`](Self::tick): the span since the previous
/// sample counts when the user is active at the sampling instant.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    focused: bool,
    last_input: Option<DateTime<Local>>,
    last_sample: Option<DateTime<Local>>,
    session_started: Option<DateTime<Local>>,
    unclaimed_ms: u64,
    session_ms: u64,
    session_tabs: u32,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&mut self, now: DateTime<Local>) {
        if !self.focused {
            self.last_sample = Some(now);
        }
        self.focused = true;
        self.last_input = Some(now);
        self.session_started.get_or_insert(now);
    }

    /// An input ping. Input also means the page has focus.
    pub fn input(&mut self, now: DateTime<Local>) {
        self.focus(now);
    }

    pub fn tab_created(&mut self) {
        self.session_tabs = self.session_tabs.saturating_add(1);
    }

    pub fn is_active(&self, now: DateTime<Local>) -> bool {
        self.focused
            && self
                .last_input
                .is_some_and(|input| (now - input).to_std().map_or(true, |idle| idle < IDLE_THRESHOLD))
    }

    /// Samples the clock. Returns the milliseconds credited by this sample.
    pub fn tick(&mut self, now: DateTime<Local>) -> u64 {
        let Some(previous) = self.last_sample.replace(now) else {
            return 0;
        };
        if !self.is_active(now) {
            return 0;
        }
        let elapsed = (now - previous).num_milliseconds().max(0) as u64;
        self.unclaimed_ms += elapsed;
        self.session_ms += elapsed;
        elapsed
    }

    /// Whole seconds accrued since the last call; the remainder carries over.
    pub fn take_elapsed_secs(&mut self) -> u64 {
        let secs = self.unclaimed_ms / 1000;
        self.unclaimed_ms %= 1000;
        secs
    }

    /// Samples one last time, drops focus and closes the session. `None`
    /// when the session accrued less than a second.
    pub fn end_session(&mut self, now: DateTime<Local>) -> Option<EndedSession> {
        self.tick(now);
        self.focused = false;
        self.last_sample = None;

        let started = self.session_started.take()?;
        let duration_secs = std::mem::take(&mut self.session_ms) / 1000;
        let tabs_opened = std::mem::take(&mut self.session_tabs);
        (duration_secs > 0).then_some(EndedSession { started, duration_secs, tabs_opened })
    }
}

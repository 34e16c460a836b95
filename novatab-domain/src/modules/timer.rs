use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

struct RunningTask {
    period: Duration,
    handle: JoinHandle<()>,
}

/// A repeating tokio task that is replaced, never duplicated.
///
/// [`restart`](Self::restart) aborts the running task before spawning the new
/// one, so two cadences never overlap. Dropping the timer aborts its task.
pub struct RepeatingTimer {
    name: &'static str,
    task: Mutex<Option<RunningTask>>,
}

impl RepeatingTimer {
    pub fn new(name: &'static str) -> Self {
        Self { name, task: Mutex::new(None) }
    }

    /// Runs `tick` every `period`, first after one full period. Returns
    /// `false` when called outside a tokio runtime.
    pub fn restart<F>(&self, period: Duration, tick: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(timer = self.name, "no tokio runtime; timer not started");
            return false;
        };

        let mut slot = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(old) = slot.take() {
            old.handle.abort();
        }
        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick();
            }
        });
        *slot = Some(RunningTask { period, handle });
        debug!(timer = self.name, period_ms = period.as_millis() as u64, "timer (re)started");
        true
    }

    pub fn cancel(&self) {
        let mut slot = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(old) = slot.take() {
            old.handle.abort();
            debug!(timer = self.name, "timer cancelled");
        }
    }

    /// Cadence of the running task, if any.
    pub fn period(&self) -> Option<Duration> {
        let slot = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.as_ref().map(|task| task.period)
    }

    pub fn is_running(&self) -> bool {
        self.period().is_some()
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for RepeatingTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatingTimer")
            .field("name", &self.name)
            .field("period", &self.period())
            .finish()
    }
}

use std::sync::Mutex;

/// Where a module's rendered view goes: a DOM region, a terminal pane, a
/// test recorder.
pub trait Surface<V>: Send + Sync {
    fn present(&self, view: &V);
}

/// Discards every view.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl<V> Surface<V> for NullSurface {
    fn present(&self, _view: &V) {}
}

/// Keeps every presented view, oldest first.
#[derive(Debug)]
pub struct RecordingSurface<V> {
    views: Mutex<Vec<V>>,
}

impl<V> Default for RecordingSurface<V> {
    fn default() -> Self {
        Self { views: Mutex::new(Vec::new()) }
    }
}

impl<V: Clone> RecordingSurface<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<V> {
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).last().cloned()
    }

    pub fn count(&self) -> usize {
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn views(&self) -> Vec<V> {
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

impl<V: Clone + Send> Surface<V> for RecordingSurface<V> {
    fn present(&self, view: &V) {
        self.views
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(view.clone());
    }
}

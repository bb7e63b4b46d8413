//! Per-item notifications raised while a batch runs.
//!
//! In parallel mode every method may be called concurrently from several workers, and the
//! order across items is unspecified. Implementations synchronize their own state.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::BatchError;

/// Receiver of batch progress.
///
/// Error and completion indices are zero-based positions in the input list. Progress reports
/// the one-based position instead, so `position == total` marks the last item.
pub trait BatchObserver: Send + Sync {
    /// Called before the item at one-based `position` of `total` starts.
    fn on_progress(&self, _position: usize, _total: usize, _label: &Path) {}

    fn on_error(&self, _index: usize, _label: &Path, _error: &BatchError) {}

    fn on_complete(&self, _index: usize, _label: &Path) {}
}

/// Observer that ignores every notification.
impl BatchObserver for () {}

type ProgressFn = dyn Fn(usize, usize, &Path) + Send + Sync;
type ErrorFn = dyn Fn(usize, &Path, &BatchError) + Send + Sync;
type CompleteFn = dyn Fn(usize, &Path) + Send + Sync;

/// Closure-backed [`BatchObserver`]; unset callbacks are skipped.
#[derive(Clone, Default)]
pub struct BatchCallbacks {
    progress: Option<Arc<ProgressFn>>,
    error: Option<Arc<ErrorFn>>,
    complete: Option<Arc<CompleteFn>>,
}

impl BatchCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(
        mut self,
        f: impl Fn(usize, usize, &Path) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(f));
        self
    }

    pub fn with_error(
        mut self,
        f: impl Fn(usize, &Path, &BatchError) + Send + Sync + 'static,
    ) -> Self {
        self.error = Some(Arc::new(f));
        self
    }

    pub fn with_complete(mut self, f: impl Fn(usize, &Path) + Send + Sync + 'static) -> Self {
        self.complete = Some(Arc::new(f));
        self
    }
}

impl BatchObserver for BatchCallbacks {
    fn on_progress(&self, position: usize, total: usize, label: &Path) {
        if let Some(f) = &self.progress {
            f(position, total, label);
        }
    }

    fn on_error(&self, index: usize, label: &Path, error: &BatchError) {
        if let Some(f) = &self.error {
            f(index, label, error);
        }
    }

    fn on_complete(&self, index: usize, label: &Path) {
        if let Some(f) = &self.complete {
            f(index, label);
        }
    }
}

impl fmt::Debug for BatchCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchCallbacks")
            .field("progress", &self.progress.is_some())
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

//! Warning sink for recoverable codec conditions.
//!
//! Building a codec can fall back instead of failing, for example when the
//! alphabet does not fit the configured code length bound. Those fallbacks
//! are reported through a [`Listener`] so the owner can log or collect them.

use std::sync::Mutex;

use tracing::warn;

/// Receives warnings from codec construction.
pub trait Listener: Send + Sync {
    /// Report a recoverable condition.
    fn warning(&self, message: &str);
}

/// Default listener that forwards warnings to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl Listener for TracingListener {
    fn warning(&self, message: &str) {
        warn!(target: "huffkit", "{message}");
    }
}

/// Listener that keeps every warning in memory.
#[derive(Debug, Default)]
pub struct CollectingListener {
    warnings: Mutex<Vec<String>>,
}

impl CollectingListener {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the warnings received so far.
    pub fn warnings(&self) -> Vec<String> {
        match self.warnings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of warnings received.
    pub fn len(&self) -> usize {
        self.warnings().len()
    }

    /// Check if no warning was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Listener for CollectingListener {
    fn warning(&self, message: &str) {
        let mut guard = match self.warnings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(message.to_string());
    }
}

impl<L: Listener + ?Sized> Listener for std::sync::Arc<L> {
    fn warning(&self, message: &str) {
        (**self).warning(message);
    }
}

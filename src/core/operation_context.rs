//! Per-run context shared by every phase of one resolution.
//!
//! A resolution run owns its graph arena; the only state that crosses phases
//! inside the run is kept here and passed explicitly instead of living in
//! globals:
//!
//! - a cooperative cancellation flag checked between expansion waves
//! - warn-once deduplication for log messages that would otherwise repeat for
//!   every node sharing the same cause (for example two common libraries
//!   claiming the same platform variant)
//!
//! Two runs never share an `OperationContext`, so cancelling one run has no
//! effect on another.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct OperationContext {
    cancelled: AtomicBool,
    cancel_reason: Mutex<Option<String>>,
    warned_keys: Mutex<HashSet<String>>,
}

impl OperationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. The builder stops before the next expansion wave.
    pub fn cancel(&self, reason: impl Into<String>) {
        let mut slot = self.cancel_reason.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(reason.into());
        }
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn cancel_reason(&self) -> Option<String> {
        self.cancel_reason.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns `true` the first time `key` is seen in this run.
    pub fn should_warn(&self, key: &str) -> bool {
        let mut warned = self.warned_keys.lock().unwrap_or_else(PoisonError::into_inner);
        warned.insert(key.to_string())
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warned_keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

//! Registry of pending notification timers.
//!
//! The store enforces the one-timer-per-kind invariant: arming a kind that
//! already holds a pending timer cancels the old one before the new handle
//! is recorded, and `cancel_all` synchronously aborts every handle before
//! returning, so re-initialization can never leave a stale timer racing a
//! fresh one.
//!
//! This is an owned object handed to its single owner (the scheduler), not
//! a module-level singleton; tests instantiate isolated stores.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::types::NotificationKind;

/// A timer armed for a future fire time.
///
/// Lives only in memory for the lifetime of the process; destroyed when
/// it fires, when re-initialization cancels it, or on shutdown.
#[derive(Debug)]
struct PendingTimer {
    fire_at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

/// In-memory map of notification kind to pending timer.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    timers: HashMap<NotificationKind, PendingTimer>,
}

impl ScheduleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pending timer for a kind.
    ///
    /// Any previously armed timer for the same kind is aborted first, so
    /// at most one timer per kind exists at any time.
    pub fn arm(&mut self, kind: NotificationKind, fire_at: DateTime<Utc>, handle: JoinHandle<()>) {
        if let Some(old) = self.timers.insert(kind, PendingTimer { fire_at, handle }) {
            old.handle.abort();
            trace!(kind = %kind, "Replaced previously armed timer");
        }
        debug!(kind = %kind, fire_at = %fire_at, "Timer armed");
    }

    /// Cancels the pending timer for a kind, if any.
    ///
    /// Returns `true` if a timer was cancelled. Cancellation is
    /// best-effort: a timer already inside its fire callback cannot be
    /// stopped mid-flight.
    pub fn cancel(&mut self, kind: NotificationKind) -> bool {
        match self.timers.remove(&kind) {
            Some(timer) => {
                timer.handle.abort();
                debug!(kind = %kind, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer and returns how many were cancelled.
    ///
    /// All handles are aborted before this returns; callers may arm new
    /// timers immediately afterwards without racing the old ones.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        for (kind, timer) in self.timers.drain() {
            timer.handle.abort();
            trace!(kind = %kind, "Timer cancelled");
        }
        if count > 0 {
            debug!(count, "All timers cancelled");
        }
        count
    }

    /// Removes a kind's entry without aborting its task.
    ///
    /// Called from inside a fire callback, where aborting would target the
    /// running task itself.
    pub fn complete(&mut self, kind: NotificationKind) {
        if self.timers.remove(&kind).is_some() {
            trace!(kind = %kind, "Timer completed");
        }
    }

    /// Whether a timer is currently pending for a kind.
    #[must_use]
    pub fn is_scheduled(&self, kind: NotificationKind) -> bool {
        self.timers.contains_key(&kind)
    }

    /// The fire time of a kind's pending timer, if any.
    #[must_use]
    pub fn fire_at(&self, kind: NotificationKind) -> Option<DateTime<Utc>> {
        self.timers.get(&kind).map(|t| t.fire_at)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for ScheduleStore {
    fn drop(&mut self) {
        for timer in self.timers.values() {
            timer.handle.abort();
        }
    }
}

//! Fail-soft notification dispatch.
//!
//! The [`Dispatcher`] hands notifications to a platform [`NotificationSink`]
//! and absorbs every failure: notifications are a convenience feature and
//! must never break or block the primary application. The only observable
//! signal of a failed dispatch is a `warn` log and a `false` return.
//!
//! Tag semantics: every notification carries a tag derived from its kind.
//! Platforms use the tag as a replace key, so a new notification with a
//! previously-used tag supersedes the old undismissed one instead of
//! stacking. The dispatcher passes tags through untouched.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::NotificationKind;

/// Errors a sink implementation can report.
///
/// These never escape the dispatcher; they exist so sinks can say what
/// went wrong in the log line.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The platform refused or failed to show the notification.
    #[error("platform dispatch failed: {0}")]
    Backend(String),

    /// The platform has no notification capability at all.
    #[error("notifications unsupported on this platform")]
    Unsupported,
}

/// A notification ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Platform replace key; same tag replaces, never stacks.
    pub tag: String,
}

impl Notification {
    /// Creates a notification tagged for the given kind.
    #[must_use]
    pub fn for_kind(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tag: kind.tag().to_string(),
        }
    }
}

/// The platform seam for actually showing a notification.
pub trait NotificationSink: Send + Sync {
    /// Shows the notification, honoring its tag as a replace key.
    fn show(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// A sink that emits notifications as structured log lines.
///
/// The default destination for headless hosts; also handy in development,
/// where a real platform sink would be noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn show(&self, notification: &Notification) -> Result<(), DispatchError> {
        info!(
            tag = %notification.tag,
            title = %notification.title,
            body = %notification.body,
            "Notification"
        );
        Ok(())
    }
}

/// Fail-soft wrapper around a [`NotificationSink`].
#[derive(Clone)]
pub struct Dispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Shows a notification, returning `true` if the sink accepted it.
    ///
    /// Sink failures are logged and reported as `false`; they never
    /// propagate.
    pub fn show(&self, notification: &Notification) -> bool {
        match self.sink.show(notification) {
            Ok(()) => {
                debug!(tag = %notification.tag, "Notification dispatched");
                true
            }
            Err(err) => {
                warn!(tag = %notification.tag, error = %err, "Notification dispatch failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

//! Permission gating for notification delivery.
//!
//! The platform's permission prompt is a one-time, user-facing
//! interruption, so the gate caches the first decision and never re-asks
//! the provider until [`PermissionGate::reset`] is called for a session
//! state change. Everything downstream short-circuits to a no-op unless
//! the cached state is [`PermissionState::Granted`].

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// Notifications may be shown.
    Granted,
    /// The user declined, or the platform has no notification support.
    Denied,
    /// No decision yet; the platform would prompt on the next request.
    Prompt,
}

impl PermissionState {
    /// Whether dispatch is allowed in this state.
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// The platform seam for requesting notification permission.
///
/// Implementations wrap whatever the host platform offers. A platform
/// without notification support must report [`PermissionState::Denied`]
/// rather than erroring; permission absence is a valid terminal state,
/// not a failure.
pub trait PermissionProvider: Send + Sync {
    /// Requests permission. May trigger a native prompt on first call.
    fn request_permission(&self) -> PermissionState;
}

/// A provider with a fixed answer, for headless hosts and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub PermissionState);

impl PermissionProvider for StaticPermission {
    fn request_permission(&self) -> PermissionState {
        self.0
    }
}

/// Caching wrapper around a [`PermissionProvider`].
///
/// The first [`check`](Self::check) consults the provider; subsequent
/// calls return the cached decision without re-prompting. `Clone` shares
/// the cache, so every holder observes the same decision.
#[derive(Clone)]
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    cached: Arc<Mutex<Option<PermissionState>>>,
}

impl PermissionGate {
    /// Creates a gate over the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self {
            provider,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the permission state, asking the provider only on the
    /// first call after construction or [`reset`](Self::reset).
    pub fn check(&self) -> PermissionState {
        let mut cached = self.cached.lock().expect("permission cache poisoned");
        if let Some(state) = *cached {
            return state;
        }

        let state = self.provider.request_permission();
        info!(state = ?state, "Notification permission resolved");
        *cached = Some(state);
        state
    }

    /// Clears the cached decision.
    ///
    /// Call on a session state change (login, settings toggle) when the
    /// platform may legitimately be asked again.
    pub fn reset(&self) {
        debug!("Permission cache cleared");
        *self.cached.lock().expect("permission cache poisoned") = None;
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("cached", &self.cached.lock().ok().map(|c| *c))
            .finish_non_exhaustive()
    }
}

//! Cross-instance sync bus.
//!
//! When one open instance of the app mutates shared state (a scenario
//! response, a lesson completion, a pod change), sibling instances holding
//! cached copies must find out or go stale. The [`SyncBus`] is the
//! broadcast channel they share: fire-and-forget, best-effort, same
//! session only. An instance that subscribes after a broadcast never sees
//! it; there is no replay and no delivery guarantee.
//!
//! The bus is deliberately dumb. Events say *what changed*, never carry
//! the new data; receivers invalidate the affected caches and re-fetch
//! from the API, which keeps correctness in one place.
//!
//! # Example
//!
//! ```rust
//! use forgepath_notify::sync::SyncBus;
//! use forgepath_notify::types::SyncEvent;
//! use uuid::Uuid;
//!
//! let bus = SyncBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.broadcast(SyncEvent::ScenarioComplete {
//!     scenario_id: Uuid::new_v4(),
//! });
//! ```

use std::sync::Arc;

use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::types::{CacheScope, SyncEvent};

/// Default channel capacity.
///
/// Sync events are small and rare (one per user mutation), so a modest
/// buffer is plenty; a receiver that still lags simply re-fetches more
/// than strictly necessary.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Broadcast hub connecting open instances of the app.
///
/// Clone to share: all clones publish into and subscribe to the same
/// channel. Many producers, many consumers, no ordering guarantee across
/// producers.
#[derive(Debug, Clone)]
pub struct SyncBus {
    sender: Sender<SyncEvent>,
}

impl SyncBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus with a custom channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        debug!(capacity, "Created sync bus");
        Self { sender }
    }

    /// Broadcasts an event to every current subscriber.
    ///
    /// Never blocks. Returns the number of subscribers that received the
    /// event; 0 when no sibling instance is listening, which is normal
    /// for a single open tab.
    pub fn broadcast(&self, event: SyncEvent) -> usize {
        trace!(event = ?event, "Broadcasting sync event");
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("No subscribers for sync event");
                0
            }
        }
    }

    /// Subscribes to events broadcast from now on.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<SyncEvent> {
        let rx = self.sender.subscribe();
        debug!(
            subscriber_count = self.subscriber_count(),
            "Sync bus subscriber added"
        );
        rx
    }

    /// Current number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver-side hook for marking cached data stale.
///
/// Implementations invalidate only; they never receive or write the new
/// data. The re-fetch happens through the instance's normal data layer.
pub trait CacheInvalidator: Send + Sync {
    /// Marks the given cache scope stale.
    fn invalidate(&self, scope: CacheScope);
}

/// Spawns a task that translates bus events into cache invalidations.
///
/// The task runs until the bus is dropped. A lagged receiver logs a
/// warning and keeps going; missed events mean at worst an extra-fresh
/// re-fetch later, never corruption.
pub fn spawn_invalidation_listener(
    bus: &SyncBus,
    invalidator: Arc<dyn CacheInvalidator>,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    for &scope in event.invalidates() {
                        trace!(scope = ?scope, "Invalidating cache scope");
                        invalidator.invalidate(scope);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Sync listener lagged, continuing");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Sync bus closed, listener exiting");
                    break;
                }
            }
        }
    })
}

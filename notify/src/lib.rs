//! Forgepath notification scheduling and cross-instance sync.
//!
//! This crate schedules activity-aware reminders (daily challenges,
//! streak nudges, weekly reflections, scenario responses, stalled
//! courses) for one member of the Forgepath app, and carries the
//! staleness signals open instances exchange when shared state changes.
//!
//! # Overview
//!
//! The scheduler pulls a user's [`types::NotificationSettings`] and
//! server-computed [`types::UserActivitySnapshot`] from the member API,
//! arms one timer per enabled notification kind at the next occurrence of
//! the user's preferred delivery time in their configured IANA zone, and
//! on fire applies a per-kind suppression rule (already done today's
//! challenge, already reflected this week) before checking the permission
//! gate and dispatching. Independently, the [`sync::SyncBus`] broadcasts
//! typed mutation events so sibling instances invalidate cached data
//! instead of going stale.
//!
//! Every failure in this subsystem degrades to "no notification appears":
//! permission denial, missing data, and platform dispatch errors are
//! absorbed, never propagated to the host.
//!
//! # Modules
//!
//! - [`types`]: settings, activity snapshot, notification kinds, sync events
//! - [`scheduler`]: the activity-aware scheduling state machine
//! - [`store`]: one-timer-per-kind registry
//! - [`clock`]: injected time source and wall-clock projection
//! - [`permission`]: idempotent permission gating
//! - [`dispatch`]: fail-soft notification dispatch
//! - [`sync`]: cross-instance broadcast bus and cache invalidation
//! - [`api`]: settings/activity REST client
//! - [`config`]: agent configuration from environment variables
//! - [`error`]: error types for the crate's fallible edges

pub mod api;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod permission;
pub mod scheduler;
pub mod store;
pub mod sync;
pub mod types;

pub use api::{ApiClient, ApiError};
pub use clock::{next_occurrence, Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError};
pub use dispatch::{DispatchError, Dispatcher, Notification, NotificationSink, TracingSink};
pub use error::{NotifyError, Result};
pub use permission::{PermissionGate, PermissionProvider, PermissionState, StaticPermission};
pub use scheduler::Scheduler;
pub use store::ScheduleStore;
pub use sync::{spawn_invalidation_listener, CacheInvalidator, SyncBus};
pub use types::{
    CacheScope, CourseProgress, NotificationKind, NotificationSettings, SyncEvent,
    UserActivitySnapshot,
};

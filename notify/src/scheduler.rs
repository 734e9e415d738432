//! Activity-aware notification scheduling.
//!
//! Each notification kind moves through a small lifecycle: unscheduled
//! until [`Scheduler::initialize_for_user`] arms a timer for the next
//! occurrence of the user's preferred delivery time, then either cancelled
//! by re-initialization or fired. A firing timer evaluates its kind's
//! suppression rule against the activity snapshot captured at
//! initialization, checks the permission gate, and only then dispatches.
//! After firing or suppression the kind is unscheduled again until the
//! host's next initialization (expected daily, and on settings changes).
//!
//! Initialization is idempotent: every pending timer is cancelled,
//! synchronously, before any new one is armed, so repeated calls leave
//! exactly one timer per enabled kind.
//!
//! Missing inputs never fail: absent settings or activity fall back to
//! the new-user defaults, and nothing in this module returns an error to
//! the caller.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::clock::{next_occurrence, Clock};
use crate::dispatch::{Dispatcher, Notification};
use crate::permission::PermissionGate;
use crate::store::ScheduleStore;
use crate::types::{NotificationKind, NotificationSettings, UserActivitySnapshot};

/// Schedules and fires per-kind notification timers for one user.
///
/// All collaborators are injected; the scheduler owns no global state.
/// `Clone` shares the underlying store, so a clone handed to a spawned
/// task observes the same timers.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<Mutex<ScheduleStore>>,
    dispatcher: Dispatcher,
    gate: PermissionGate,
    clock: Arc<dyn Clock>,
    stall_threshold_days: u32,
}

impl Scheduler {
    /// Creates a scheduler with the default stalled-course threshold.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, gate: PermissionGate, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(Mutex::new(ScheduleStore::new())),
            dispatcher,
            gate,
            clock,
            stall_threshold_days: crate::config::DEFAULT_STALL_THRESHOLD_DAYS,
        }
    }

    /// Overrides the stalled-course threshold (builder pattern).
    #[must_use]
    pub fn with_stall_threshold(mut self, days: u32) -> Self {
        self.stall_threshold_days = days;
        self
    }

    /// Arms timers for every enabled notification kind.
    ///
    /// Both inputs are optional: `None` applies the new-user policy
    /// instead of erroring, so a fresh account with no stored settings or
    /// activity still gets onboarding-style reminders.
    ///
    /// Any previously armed timers are cancelled before new ones are
    /// armed; calling this repeatedly with the same inputs leaves exactly
    /// one pending timer per enabled kind.
    pub fn initialize_for_user(
        &self,
        settings: Option<NotificationSettings>,
        activity: Option<UserActivitySnapshot>,
    ) {
        let settings = settings.unwrap_or_else(|| {
            debug!("No notification settings, applying new-user defaults");
            NotificationSettings::default()
        });
        let activity = activity.unwrap_or_else(|| {
            debug!("No activity snapshot, treating as new user");
            UserActivitySnapshot::default()
        });

        let mut store = self.store.lock().expect("schedule store poisoned");
        let cancelled = store.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "Cancelled timers before re-initialization");
        }

        if !settings.enable_browser_notifications {
            info!("Browser notifications disabled, nothing scheduled");
            return;
        }

        let now = self.clock.now_utc();
        let activity = Arc::new(activity);
        let mut armed = 0usize;

        for kind in NotificationKind::ALL {
            if !settings.kind_enabled(kind) {
                continue;
            }

            let fire_at =
                next_occurrence(now, &settings.notification_time, &settings.timezone);
            let delay = (fire_at - now)
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);

            let scheduler = self.clone();
            let snapshot = Arc::clone(&activity);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                scheduler.fire(kind, &snapshot);
            });

            store.arm(kind, fire_at, handle);
            armed += 1;
        }

        info!(
            armed,
            time = %settings.notification_time,
            timezone = %settings.timezone,
            "Notification timers initialized"
        );
    }

    /// Cancels every pending timer.
    ///
    /// Synchronous and best-effort: not-yet-fired timers are gone when
    /// this returns; a timer already inside its fire callback runs to
    /// completion (the callback is brief and non-blocking).
    pub fn cancel_all(&self) {
        let cancelled = self
            .store
            .lock()
            .expect("schedule store poisoned")
            .cancel_all();
        debug!(cancelled, "All notification timers cancelled");
    }

    /// Whether a timer is pending for the given kind.
    #[must_use]
    pub fn is_scheduled(&self, kind: NotificationKind) -> bool {
        self.store
            .lock()
            .expect("schedule store poisoned")
            .is_scheduled(kind)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn scheduled_count(&self) -> usize {
        self.store.lock().expect("schedule store poisoned").len()
    }

    /// The pending fire time for a kind, if armed.
    #[must_use]
    pub fn fire_time(&self, kind: NotificationKind) -> Option<chrono::DateTime<chrono::Utc>> {
        self.store
            .lock()
            .expect("schedule store poisoned")
            .fire_at(kind)
    }

    /// The fire callback: suppression, then permission, then dispatch.
    ///
    /// Runs on the timer task. Fast and non-blocking; every failure mode
    /// degrades to "no notification appears".
    fn fire(&self, kind: NotificationKind, activity: &UserActivitySnapshot) {
        self.store
            .lock()
            .expect("schedule store poisoned")
            .complete(kind);

        let Some(notification) = build_notification(kind, activity, self.stall_threshold_days)
        else {
            debug!(kind = %kind, "Notification suppressed");
            return;
        };

        let state = self.gate.check();
        if !state.is_granted() {
            debug!(kind = %kind, state = ?state, "Notification blocked by permission state");
            return;
        }

        if !self.dispatcher.show(&notification) {
            warn!(kind = %kind, "Notification was not shown");
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("stall_threshold_days", &self.stall_threshold_days)
            .finish_non_exhaustive()
    }
}

/// Applies the per-kind suppression rule and builds the message.
///
/// Returns `None` when the underlying action has already been completed
/// (or, for course reminders, when no course is stalled). The snapshot is
/// the one captured at initialization; it is not re-fetched here, so a
/// user who completed the action after initialization may still get a
/// late reminder. Accepted: notifications are non-critical.
fn build_notification(
    kind: NotificationKind,
    activity: &UserActivitySnapshot,
    stall_threshold_days: u32,
) -> Option<Notification> {
    match kind {
        NotificationKind::DailyChallenge => {
            if activity.has_completed_todays_challenge {
                return None;
            }
            Some(Notification::for_kind(
                kind,
                "Today's challenge",
                "Three focused minutes. Take on today's challenge.",
            ))
        }
        NotificationKind::StreakNudge => {
            if activity.has_completed_todays_challenge {
                return None;
            }
            let (title, body) = if activity.streak_at_risk {
                (
                    "Don't break the chain".to_string(),
                    format!(
                        "Your {}-day streak ends tonight unless you complete today's challenge.",
                        activity.current_streak
                    ),
                )
            } else {
                (
                    "Keep your momentum".to_string(),
                    "A quick win today keeps your streak alive.".to_string(),
                )
            };
            Some(Notification::for_kind(kind, title, body))
        }
        NotificationKind::WeeklyReflection => {
            if activity.has_reflection_this_week {
                return None;
            }
            Some(Notification::for_kind(
                kind,
                "Weekly reflection",
                "Take ten minutes to look back at your week.",
            ))
        }
        NotificationKind::ScenarioReminder => {
            if activity.has_scenario_response_this_week {
                return None;
            }
            Some(Notification::for_kind(
                kind,
                "This week's scenario",
                "A new decision scenario is waiting for your response.",
            ))
        }
        NotificationKind::CourseReminder => {
            let course = activity.most_stalled_course(stall_threshold_days)?;
            Some(Notification::for_kind(
                kind,
                "Pick your course back up",
                format!(
                    "{} is at {}%. It's been {} days since your last lesson.",
                    course.title, course.progress_percent, course.days_since_last_progress
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CourseProgress;
    use uuid::Uuid;

    fn snapshot() -> UserActivitySnapshot {
        UserActivitySnapshot::default()
    }

    #[test]
    fn daily_challenge_suppressed_when_completed() {
        let activity = UserActivitySnapshot {
            has_completed_todays_challenge: true,
            ..snapshot()
        };
        assert!(build_notification(NotificationKind::DailyChallenge, &activity, 7).is_none());
    }

    #[test]
    fn daily_challenge_fires_when_not_completed() {
        let n = build_notification(NotificationKind::DailyChallenge, &snapshot(), 7).unwrap();
        assert_eq!(n.tag, "daily-challenge");
        assert_eq!(n.title, "Today's challenge");
    }

    #[test]
    fn streak_nudge_suppressed_when_completed() {
        let activity = UserActivitySnapshot {
            has_completed_todays_challenge: true,
            streak_at_risk: true,
            ..snapshot()
        };
        assert!(build_notification(NotificationKind::StreakNudge, &activity, 7).is_none());
    }

    #[test]
    fn streak_nudge_escalates_when_at_risk() {
        let activity = UserActivitySnapshot {
            current_streak: 12,
            streak_at_risk: true,
            ..snapshot()
        };
        let n = build_notification(NotificationKind::StreakNudge, &activity, 7).unwrap();
        assert_eq!(n.title, "Don't break the chain");
        assert!(n.body.contains("12-day streak"));
    }

    #[test]
    fn streak_nudge_stays_gentle_when_safe() {
        let activity = UserActivitySnapshot {
            current_streak: 3,
            streak_at_risk: false,
            ..snapshot()
        };
        let n = build_notification(NotificationKind::StreakNudge, &activity, 7).unwrap();
        assert_eq!(n.title, "Keep your momentum");
    }

    #[test]
    fn weekly_reflection_suppressed_when_reflected() {
        let activity = UserActivitySnapshot {
            has_reflection_this_week: true,
            ..snapshot()
        };
        assert!(build_notification(NotificationKind::WeeklyReflection, &activity, 7).is_none());
        assert!(build_notification(NotificationKind::WeeklyReflection, &snapshot(), 7).is_some());
    }

    #[test]
    fn scenario_reminder_suppressed_when_responded() {
        let activity = UserActivitySnapshot {
            has_scenario_response_this_week: true,
            ..snapshot()
        };
        assert!(build_notification(NotificationKind::ScenarioReminder, &activity, 7).is_none());
        assert!(build_notification(NotificationKind::ScenarioReminder, &snapshot(), 7).is_some());
    }

    #[test]
    fn course_reminder_requires_a_stalled_course() {
        // No courses at all: nothing to remind about.
        assert!(build_notification(NotificationKind::CourseReminder, &snapshot(), 7).is_none());

        // Courses below the threshold do not count.
        let active = UserActivitySnapshot {
            active_courses: vec![CourseProgress {
                course_id: Uuid::new_v4(),
                title: "Grounded Decision Making".to_string(),
                progress_percent: 40,
                days_since_last_progress: 3,
            }],
            ..snapshot()
        };
        assert!(build_notification(NotificationKind::CourseReminder, &active, 7).is_none());
    }

    #[test]
    fn course_reminder_names_the_stalled_course() {
        let activity = UserActivitySnapshot {
            active_courses: vec![CourseProgress {
                course_id: Uuid::new_v4(),
                title: "Grounded Decision Making".to_string(),
                progress_percent: 40,
                days_since_last_progress: 9,
            }],
            ..snapshot()
        };
        let n = build_notification(NotificationKind::CourseReminder, &activity, 7).unwrap();
        assert!(n.body.contains("Grounded Decision Making"));
        assert!(n.body.contains("40%"));
        assert!(n.body.contains("9 days"));
    }

    #[test]
    fn new_user_snapshot_is_eligible_for_onboarding_kinds() {
        // The default snapshot suppresses nothing except course reminders,
        // so a brand-new user gets the onboarding-style prompts.
        let activity = snapshot();
        assert!(build_notification(NotificationKind::DailyChallenge, &activity, 7).is_some());
        assert!(build_notification(NotificationKind::StreakNudge, &activity, 7).is_some());
        assert!(build_notification(NotificationKind::WeeklyReflection, &activity, 7).is_some());
        assert!(build_notification(NotificationKind::ScenarioReminder, &activity, 7).is_some());
        assert!(build_notification(NotificationKind::CourseReminder, &activity, 7).is_none());
    }
}

//! Integration tests for scheduler lifecycle behavior.
//!
//! These tests drive the scheduler end to end with a pinned manual clock
//! and paused tokio time, so timers "elapse" deterministically without
//! waiting for wall-clock days.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use forgepath_notify::{
    DispatchError, Dispatcher, ManualClock, Notification, NotificationKind, NotificationSettings,
    NotificationSink, PermissionGate, PermissionState, Scheduler, StaticPermission,
    UserActivitySnapshot,
};

// =============================================================================
// Test Helpers
// =============================================================================

/// Sink that records every notification shown.
#[derive(Default)]
struct RecordingSink {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    fn tags(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.tag.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn show(&self, notification: &Notification) -> Result<(), DispatchError> {
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// A Monday noon UTC; settings below schedule for 09:00 UTC, so the next
/// fire is Tuesday 09:00, 21 hours out.
const NOW: &str = "2026-06-15T12:00:00Z";

fn test_settings() -> NotificationSettings {
    NotificationSettings {
        notification_time: "09:00".to_string(),
        timezone: "UTC".to_string(),
        ..NotificationSettings::default()
    }
}

fn build_scheduler(
    permission: PermissionState,
) -> (Scheduler, Arc<RecordingSink>, ManualClock) {
    let sink = Arc::new(RecordingSink::default());
    let clock = ManualClock::new(utc(NOW));
    let scheduler = Scheduler::new(
        Dispatcher::new(sink.clone()),
        PermissionGate::new(Arc::new(StaticPermission(permission))),
        Arc::new(clock.clone()),
    );
    (scheduler, sink, clock)
}

/// Fast-forwards paused tokio time past every armed timer.
async fn elapse_past_fire_time() {
    tokio::time::sleep(Duration::from_secs(22 * 3600)).await;
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test(start_paused = true)]
async fn initialization_arms_one_timer_per_enabled_kind() {
    let (scheduler, _sink, _clock) = build_scheduler(PermissionState::Granted);

    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));

    assert_eq!(scheduler.scheduled_count(), NotificationKind::ALL.len());
    for kind in NotificationKind::ALL {
        assert!(scheduler.is_scheduled(kind), "{kind} should be scheduled");
    }
}

#[tokio::test(start_paused = true)]
async fn initialization_is_idempotent() {
    let (scheduler, _sink, _clock) = build_scheduler(PermissionState::Granted);

    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));
    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));

    // Cancel-before-arm: still exactly one timer per kind, not two.
    assert_eq!(scheduler.scheduled_count(), NotificationKind::ALL.len());
}

#[tokio::test(start_paused = true)]
async fn master_switch_disables_everything() {
    let (scheduler, _sink, _clock) = build_scheduler(PermissionState::Granted);

    let settings = NotificationSettings {
        enable_browser_notifications: false,
        ..test_settings()
    };
    scheduler.initialize_for_user(Some(settings), Some(UserActivitySnapshot::default()));

    assert_eq!(scheduler.scheduled_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn channel_flags_gate_their_kinds() {
    let (scheduler, _sink, _clock) = build_scheduler(PermissionState::Granted);

    let settings = NotificationSettings {
        daily_challenge: false,
        ..test_settings()
    };
    scheduler.initialize_for_user(Some(settings), Some(UserActivitySnapshot::default()));

    assert!(!scheduler.is_scheduled(NotificationKind::DailyChallenge));
    assert!(!scheduler.is_scheduled(NotificationKind::StreakNudge));
    assert!(scheduler.is_scheduled(NotificationKind::WeeklyReflection));
    assert!(scheduler.is_scheduled(NotificationKind::ScenarioReminder));
    assert!(scheduler.is_scheduled(NotificationKind::CourseReminder));
}

#[tokio::test(start_paused = true)]
async fn missing_inputs_apply_new_user_policy() {
    let (scheduler, _sink, _clock) = build_scheduler(PermissionState::Granted);

    // Neither settings nor activity: must not panic, must schedule with
    // the defaults (everything enabled).
    scheduler.initialize_for_user(None, None);

    assert_eq!(scheduler.scheduled_count(), NotificationKind::ALL.len());
}

#[tokio::test(start_paused = true)]
async fn fire_time_respects_configured_timezone() {
    let (scheduler, _sink, clock) = build_scheduler(PermissionState::Granted);

    // 13:05 UTC is 09:05 in New York: today's 09:00 has passed, so the
    // timer must target tomorrow 09:00 New York (13:00 UTC).
    clock.set(utc("2026-06-15T13:05:00Z"));
    let settings = NotificationSettings {
        timezone: "America/New_York".to_string(),
        ..test_settings()
    };
    scheduler.initialize_for_user(Some(settings), Some(UserActivitySnapshot::default()));

    assert_eq!(
        scheduler.fire_time(NotificationKind::DailyChallenge),
        Some(utc("2026-06-16T13:00:00Z"))
    );
}

// =============================================================================
// Firing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn timers_fire_and_dispatch_when_granted() {
    let (scheduler, sink, _clock) = build_scheduler(PermissionState::Granted);

    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));
    elapse_past_fire_time().await;

    let tags = sink.tags();
    // A new user has no stalled course, so the course reminder is the one
    // kind that stays silent.
    assert!(tags.contains(&"daily-challenge".to_string()));
    assert!(tags.contains(&"streak-nudge".to_string()));
    assert!(tags.contains(&"weekly-reflection".to_string()));
    assert!(tags.contains(&"scenario-reminder".to_string()));
    assert!(!tags.contains(&"course-reminder".to_string()));
}

#[tokio::test(start_paused = true)]
async fn fired_kinds_return_to_unscheduled() {
    let (scheduler, _sink, _clock) = build_scheduler(PermissionState::Granted);

    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));
    elapse_past_fire_time().await;

    assert_eq!(scheduler.scheduled_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn completed_challenge_suppresses_daily_kinds() {
    let (scheduler, sink, _clock) = build_scheduler(PermissionState::Granted);

    let activity = UserActivitySnapshot {
        has_completed_todays_challenge: true,
        ..UserActivitySnapshot::default()
    };
    scheduler.initialize_for_user(Some(test_settings()), Some(activity));
    elapse_past_fire_time().await;

    let tags = sink.tags();
    assert!(!tags.contains(&"daily-challenge".to_string()));
    assert!(!tags.contains(&"streak-nudge".to_string()));
    assert!(tags.contains(&"weekly-reflection".to_string()));
}

#[tokio::test(start_paused = true)]
async fn denied_permission_blocks_all_dispatch() {
    let (scheduler, sink, _clock) = build_scheduler(PermissionState::Denied);

    // Nothing suppressed for this snapshot, so only the permission gate
    // stands between the timers and the sink.
    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));
    elapse_past_fire_time().await;

    assert!(sink.shown.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn prompt_state_also_blocks_dispatch() {
    let (scheduler, sink, _clock) = build_scheduler(PermissionState::Prompt);

    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));
    elapse_past_fire_time().await;

    assert!(sink.shown.lock().unwrap().is_empty());
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn cancel_all_prevents_firing() {
    let (scheduler, sink, _clock) = build_scheduler(PermissionState::Granted);

    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));
    scheduler.cancel_all();
    assert_eq!(scheduler.scheduled_count(), 0);

    elapse_past_fire_time().await;
    assert!(sink.shown.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reinitialization_replaces_old_timers_without_double_fire() {
    let (scheduler, sink, _clock) = build_scheduler(PermissionState::Granted);

    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));
    scheduler.initialize_for_user(Some(test_settings()), Some(UserActivitySnapshot::default()));
    elapse_past_fire_time().await;

    // Each kind fired at most once despite two initializations.
    let tags = sink.tags();
    let daily = tags.iter().filter(|t| *t == "daily-challenge").count();
    assert_eq!(daily, 1);
}

//! Shared types for the notification subsystem.
//!
//! This module defines the data the scheduler consumes (settings and the
//! server-computed activity snapshot) and the typed event union carried by
//! the cross-instance sync bus. API-facing structs use `camelCase` field
//! names to match the JSON contract of the member API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default wall-clock delivery time applied when settings are absent or
/// the configured time string cannot be parsed.
pub const DEFAULT_NOTIFICATION_TIME: &str = "09:00";

/// The kinds of reminder the scheduler knows how to deliver.
///
/// At most one pending timer exists per kind at any time; the kind also
/// determines the suppression rule evaluated when its timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Daily challenge prompt.
    DailyChallenge,
    /// Streak-preservation nudge; escalates when the streak is at risk.
    StreakNudge,
    /// Weekly reflection prompt (Monday–Sunday window).
    WeeklyReflection,
    /// Reminder to respond to the current week's scenario exercise.
    ScenarioReminder,
    /// Reminder about a course with no recent progress.
    CourseReminder,
}

impl NotificationKind {
    /// All kinds, in scheduling order.
    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::DailyChallenge,
        NotificationKind::StreakNudge,
        NotificationKind::WeeklyReflection,
        NotificationKind::ScenarioReminder,
        NotificationKind::CourseReminder,
    ];

    /// Stable platform tag for this kind.
    ///
    /// A notification shown with a tag replaces any prior undismissed
    /// notification with the same tag rather than stacking a second one.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::DailyChallenge => "daily-challenge",
            Self::StreakNudge => "streak-nudge",
            Self::WeeklyReflection => "weekly-reflection",
            Self::ScenarioReminder => "scenario-reminder",
            Self::CourseReminder => "course-reminder",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A user's notification preferences, as returned by the settings API.
///
/// Read-only input to the scheduler; mutated only through the settings
/// endpoint, never by this subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    /// Master switch. When false, nothing is scheduled regardless of the
    /// per-channel flags below.
    pub enable_browser_notifications: bool,

    /// Weekly reflection prompts.
    pub weekly_reflection: bool,

    /// Daily challenge prompts and streak nudges.
    pub daily_challenge: bool,

    /// Journal prompts, including scenario-response reminders.
    pub journal: bool,

    /// Community/pod activity. Carried for API round-trip fidelity; gates
    /// no scheduled kind in this subsystem.
    pub community: bool,

    /// Stalled-course reminders.
    pub course_reminders: bool,

    /// Preferred local delivery time, "HH:MM" (24-hour).
    pub notification_time: String,

    /// IANA zone name the delivery time is expressed in. May differ from
    /// the device zone.
    pub timezone: String,
}

impl Default for NotificationSettings {
    /// The new-user policy: every channel enabled, 09:00 UTC.
    fn default() -> Self {
        Self {
            enable_browser_notifications: true,
            weekly_reflection: true,
            daily_challenge: true,
            journal: true,
            community: true,
            course_reminders: true,
            notification_time: DEFAULT_NOTIFICATION_TIME.to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

impl NotificationSettings {
    /// Whether the channel flag for `kind` is enabled.
    ///
    /// Does not consult the master switch; callers check that separately.
    #[must_use]
    pub fn kind_enabled(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::DailyChallenge | NotificationKind::StreakNudge => {
                self.daily_challenge
            }
            NotificationKind::WeeklyReflection => self.weekly_reflection,
            NotificationKind::ScenarioReminder => self.journal,
            NotificationKind::CourseReminder => self.course_reminders,
        }
    }
}

/// Per-course progress facts inside an activity snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub title: String,
    /// Completion percentage, 0–100.
    pub progress_percent: u8,
    /// Days since the last recorded lesson completion in this course.
    pub days_since_last_progress: u32,
}

impl CourseProgress {
    /// Whether this course counts as stalled at the given threshold.
    #[must_use]
    pub fn is_stalled(&self, threshold_days: u32) -> bool {
        self.days_since_last_progress >= threshold_days
    }
}

/// A point-in-time view of a user's recent activity, computed server-side.
///
/// The scheduler never mutates this; it is captured at initialization and
/// consulted when timers fire. `Default` describes a brand-new user with
/// no recorded activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserActivitySnapshot {
    pub last_challenge_date: Option<NaiveDate>,
    pub last_scenario_date: Option<NaiveDate>,
    pub last_learning_date: Option<NaiveDate>,

    /// Consecutive days of completed challenges.
    pub current_streak: u32,

    /// Set by the server when the streak will lapse unless today's
    /// challenge is completed.
    pub streak_at_risk: bool,

    pub has_completed_todays_challenge: bool,

    /// A response exists for the current week's scenario.
    pub has_scenario_response_this_week: bool,

    /// A reflection exists for the current Monday–Sunday window.
    pub has_reflection_this_week: bool,

    pub active_courses: Vec<CourseProgress>,
}

impl UserActivitySnapshot {
    /// The most-stalled active course at or past the threshold, if any.
    #[must_use]
    pub fn most_stalled_course(&self, threshold_days: u32) -> Option<&CourseProgress> {
        self.active_courses
            .iter()
            .filter(|c| c.is_stalled(threshold_days))
            .max_by_key(|c| c.days_since_last_progress)
    }
}

/// The caches a sync event makes stale in sibling instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Scenarios,
    Stats,
    Dashboard,
    Courses,
    Pods,
    Journal,
}

/// A mutation announcement broadcast between open instances of the app.
///
/// Events are fire-and-forget staleness signals: they name what changed,
/// never carry the new data. Receivers invalidate the affected caches and
/// re-fetch. Serialized with a snake_case `type` tag to match the wire
/// format used between instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The user submitted a response to a scenario exercise.
    #[serde(rename_all = "camelCase")]
    ScenarioComplete { scenario_id: Uuid },

    /// The user completed a course lesson.
    #[serde(rename_all = "camelCase")]
    LessonComplete { lesson_id: Uuid, course_id: Uuid },

    /// The user completed today's challenge.
    #[serde(rename_all = "camelCase")]
    ChallengeComplete { challenge_id: Uuid },

    /// Something changed in one of the user's accountability pods.
    #[serde(rename_all = "camelCase")]
    PodUpdate { pod_id: Uuid },
}

impl SyncEvent {
    /// The cache scopes a receiving instance must invalidate.
    ///
    /// Exhaustive by construction: adding an event variant forces a scope
    /// decision here.
    #[must_use]
    pub fn invalidates(&self) -> &'static [CacheScope] {
        match self {
            Self::ScenarioComplete { .. } => {
                &[CacheScope::Scenarios, CacheScope::Stats, CacheScope::Dashboard]
            }
            Self::LessonComplete { .. } => {
                &[CacheScope::Courses, CacheScope::Stats, CacheScope::Dashboard]
            }
            Self::ChallengeComplete { .. } => &[CacheScope::Stats, CacheScope::Dashboard],
            Self::PodUpdate { .. } => &[CacheScope::Pods, CacheScope::Dashboard],
        }
    }
}

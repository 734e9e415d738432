//! Time source abstraction and wall-clock scheduling arithmetic.
//!
//! All "now" reads in the scheduling path go through the [`Clock`] trait so
//! tests can pin the current time and exercise timezone edges
//! deterministically. [`next_occurrence`] projects a user's preferred
//! "HH:MM" delivery time, expressed in their configured IANA zone, onto the
//! next future instant.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::types::DEFAULT_NOTIFICATION_TIME;

/// A source of the current time.
///
/// Implementations must be cheap to call; the scheduler reads the clock on
/// every initialization and timer computation.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests and simulations.
///
/// Cloning shares the underlying instant, so a clone handed to the
/// scheduler observes later `set`/`advance` calls.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a manual clock pinned at the given instant.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Repins the clock to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = now;
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

/// Computes the next future occurrence of `time_of_day` ("HH:MM") in the
/// IANA zone named by `zone`, relative to `now`.
///
/// If today's occurrence in that zone is still ahead it is used; otherwise
/// the result is tomorrow at the same wall-clock time. The user's
/// configured zone is authoritative, never the device zone.
///
/// Malformed inputs degrade rather than fail: an unparseable time string
/// falls back to 09:00 and an unknown zone to UTC, both logged. A
/// wall-clock time skipped by a DST spring-forward resolves to the later
/// valid instant; an ambiguous fall-back time resolves to the earlier one.
#[must_use]
pub fn next_occurrence(now: DateTime<Utc>, time_of_day: &str, zone: &str) -> DateTime<Utc> {
    let target = parse_time_of_day(time_of_day);
    let tz = parse_zone(zone);

    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();

    let candidate = resolve_local(today.and_time(target), tz);
    if candidate > now {
        return candidate;
    }

    let tomorrow = today.succ_opt().unwrap_or(today);
    resolve_local(tomorrow.and_time(target), tz)
}

/// Resolves a naive local datetime in `tz` to a UTC instant.
///
/// DST gap: shift forward an hour and take the earliest valid mapping.
/// DST overlap: take the earlier of the two instants.
fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        chrono::LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map_or_else(|| Utc.from_utc_datetime(&naive), |dt| dt.with_timezone(&Utc))
        }
    }
}

fn parse_time_of_day(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").unwrap_or_else(|_| {
        warn!(time = raw, "Unparseable notification time, using default");
        NaiveTime::parse_from_str(DEFAULT_NOTIFICATION_TIME, "%H:%M")
            .expect("default notification time is valid")
    })
}

fn parse_zone(raw: &str) -> Tz {
    raw.parse::<Tz>().unwrap_or_else(|_| {
        warn!(zone = raw, "Unknown IANA timezone, using UTC");
        Tz::UTC
    })
}

//! Tax week boundary calculation
//!
//! Payments are aggregated over a weekly window that rolls over every
//! Friday at 20:00 UTC. "Paid this week" means paid at or after the
//! most recent such boundary.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

/// Weekday index of the rollover day (Monday = 0, Friday = 4).
const ROLLOVER_WEEKDAY: i64 = 4;
/// Hour (UTC) of the rollover.
const ROLLOVER_HOUR: u32 = 20;

/// Most recent Friday 20:00 UTC at or before `now`.
pub fn epoch_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_friday =
        (now.weekday().num_days_from_monday() as i64 - ROLLOVER_WEEKDAY).rem_euclid(7);
    let friday = now - Duration::days(days_since_friday);
    let mut boundary = friday
        .with_hour(ROLLOVER_HOUR)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .expect("fixed rollover time is always a valid UTC time");
    // Exactly on the rollover weekday but before the rollover hour:
    // the window started the previous week.
    if now < boundary {
        boundary -= Duration::days(7);
    }
    boundary
}

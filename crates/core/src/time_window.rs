//! UTC calendar-day window used by the co-activity filter.

use chrono::{Duration, NaiveTime, TimeZone, Utc};

use crate::types::Timestamp;

/// Half-open `[start, end)` bounds of the UTC calendar day containing `at`.
pub fn utc_day_bounds(at: Timestamp) -> (Timestamp, Timestamp) {
    let start = Utc.from_utc_datetime(&at.date_naive().and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}

use chrono::{DateTime, Duration, Utc};

/// Every cached kind goes stale after the same 24-hour window.
pub const MAX_AGE_HOURS: i64 = 24;

pub fn is_stale(last_updated: DateTime<Utc>) -> bool {
    is_stale_at(last_updated, Utc::now())
}

fn is_stale_at(last_updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last_updated > Duration::hours(MAX_AGE_HOURS)
}

//! Timestamp helpers shared by the stores and the exports.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// `yyyy-MM-dd HH:mm`, as shown in exports.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(EXPORT_TIMESTAMP_FORMAT).to_string()
}

/// Current time at the microsecond precision Postgres stores, rounded up so a stored
/// timestamp is never earlier than the moment it was taken.
pub fn stored_now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_round_up(TimeDelta::microseconds(1)).unwrap_or(now)
}

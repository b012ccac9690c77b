//! Date and time utility functions
//!
//! Task timestamps are stored as RFC 3339 strings with microsecond precision so that
//! two writes in quick succession still compare as different values.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};

/// Formats accepted for timestamps written by older clients without a timezone
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Format a UTC datetime the way it is persisted
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time as a persisted timestamp string
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339 (any offset) and a few naive ISO-8601 layouts, which are read as UTC.
///
/// # Returns
/// * `Option<DateTime<Utc>>` - `None` when the string is not a recognizable timestamp
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Timestamp for a mutation that follows `previous`
///
/// Returns "now", unless that would not be strictly later than `previous`
/// (same microsecond, or a clock that stepped backwards), in which case it returns
/// `previous + 1µs`. Conditional writes keyed on `updated_at` rely on this.
pub fn next_timestamp(previous: Option<&str>) -> String {
    let now = Utc::now();
    match previous.and_then(parse_timestamp) {
        Some(prev) if prev >= now => format_timestamp(prev + Duration::microseconds(1)),
        _ => format_timestamp(now),
    }
}

/// Whether `timestamp` is at least `days` old relative to `now`
pub fn is_older_than_days(timestamp: DateTime<Utc>, now: DateTime<Utc>, days: u64) -> bool {
    // TimeDelta is bounded by i64::MAX milliseconds
    let days = i64::try_from(days).unwrap_or(i64::MAX).min(i64::MAX / 86_400_000);
    now.signed_duration_since(timestamp) >= Duration::days(days)
}

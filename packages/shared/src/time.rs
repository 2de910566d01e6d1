use chrono::{DateTime, Utc};

/// Wire format of every outbound `timestamp` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current Unix timestamp in UTC (milliseconds)
pub fn get_utc_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a Unix timestamp (milliseconds) as `YYYY-MM-DD HH:MM:SS` in UTC.
///
/// Out-of-range values fall back to the Unix epoch.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

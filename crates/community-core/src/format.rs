//! Display formatting for counts and timestamps.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Abbreviates a counter: `1k`, `10k`, `100k` at the respective thresholds.
pub fn format_count(count: u64) -> String {
    match count {
        100_000.. => "100k".to_string(),
        10_000.. => "10k".to_string(),
        1_000.. => "1k".to_string(),
        n => n.to_string(),
    }
}

/// Renders an ISO-8601 timestamp as `YYYY-MM-DD HH:mm:ss` in local time.
///
/// Missing or unparseable input renders as an empty string. Timestamps
/// without an offset are taken as local time.
pub fn format_datetime(value: Option<&str>) -> String {
    value
        .and_then(parse_timestamp)
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Local>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

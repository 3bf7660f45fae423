// Timestamp formatting for display

use chrono::{Local, TimeZone};

/// Format a Unix timestamp as a local date ("2026-08-07")
pub fn format_date(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d").to_string(),
        _ => "-".to_string(),
    }
}

/// Format a Unix timestamp as a local date and time ("2026-08-07 14:30")
pub fn format_datetime(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => "-".to_string(),
    }
}

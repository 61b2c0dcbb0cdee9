//! Lenient timestamp parsing for pipeline-supplied time text.
//!
//! Devices and the pipeline disagree on formats; accepted layouts:
//! RFC 3339 (with or without fractional seconds), `YYYY-MM-DD HH:MM:SS`
//! (zero padding optional), and the `T`-separated form without an offset.
//! Text without an offset is taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse time text, returning `None` when no layout matches.
pub fn parse_time_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .map(|naive| naive.and_utc())
}

/// Parse time text or fall back to `fallback`.
pub fn parse_time_or(text: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    parse_time_text(text).unwrap_or(fallback)
}

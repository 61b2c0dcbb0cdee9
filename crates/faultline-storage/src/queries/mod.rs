//! Per-table query functions. Each takes a borrowed `Connection` and is
//! called from inside a `ConnectionPool` closure.

pub mod events;
pub mod masks;
pub mod snapshots;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

use faultline_core::ClockPolicy;

/// Column holding the authoritative timestamp for `clock`.
pub(crate) fn time_column(clock: ClockPolicy) -> &'static str {
    match clock {
        ClockPolicy::Device => "event_time",
        ClockPolicy::Ingest => "ingest_time",
    }
}

pub(crate) fn to_millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

/// Decode an epoch-millis column inside a row mapper.
pub(crate) fn from_millis(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {ms}").into(),
        )
    })
}

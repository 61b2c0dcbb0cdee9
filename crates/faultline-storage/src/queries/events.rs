//! fault_events queries.

use rusqlite::{params, Connection, Row};

use faultline_core::{ClockPolicy, EventFilter, FaultEvent, StorageError, TimeRange};

use super::{from_millis, time_column, to_millis};
use crate::sqe;

fn map_event(row: &Row<'_>) -> rusqlite::Result<FaultEvent> {
    Ok(FaultEvent {
        unit_key: row.get(0)?,
        group_key: row.get(1)?,
        sub_key: row.get(2)?,
        fault_code: row.get(3)?,
        fault_name: row.get(4)?,
        severity: row.get(5)?,
        event_type: row.get(6)?,
        event_time: from_millis(7, row.get(7)?)?,
        ingest_time: from_millis(8, row.get(8)?)?,
    })
}

/// Append an event. A repeat of `(event_time, unit_key, fault_code)` only
/// refreshes the stored `ingest_time`.
pub fn append_event(conn: &Connection, event: &FaultEvent) -> Result<(), StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO fault_events
             (unit_key, group_key, sub_key, fault_code, fault_name, severity,
              event_type, event_time, ingest_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (event_time, unit_key, fault_code)
             DO UPDATE SET ingest_time = excluded.ingest_time",
        )
        .map_err(sqe)?;
    stmt.execute(params![
        event.unit_key,
        event.group_key,
        event.sub_key,
        event.fault_code,
        event.fault_name,
        event.severity,
        event.event_type,
        to_millis(event.event_time),
        to_millis(event.ingest_time),
    ])
    .map_err(sqe)?;
    Ok(())
}

/// Events inside `range` under the active clock, newest first.
pub fn events_in_range(
    conn: &Connection,
    clock: ClockPolicy,
    range: &TimeRange,
    filter: &EventFilter,
    limit: usize,
) -> Result<Vec<FaultEvent>, StorageError> {
    let col = time_column(clock);
    let sql = format!(
        "SELECT unit_key, group_key, sub_key, fault_code, fault_name, severity,
                event_type, event_time, ingest_time
         FROM fault_events
         WHERE {col} >= ?1 AND {col} <= ?2
           AND (?3 IS NULL OR group_key = ?3)
           AND (?4 IS NULL OR event_type = ?4)
         ORDER BY {col} DESC, id DESC
         LIMIT ?5"
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare_cached(&sql).map_err(sqe)?;
    let rows = stmt
        .query_map(
            params![
                to_millis(range.start),
                to_millis(range.end),
                filter.group_key,
                filter.event_type,
                limit,
            ],
            map_event,
        )
        .map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(sqe)?);
    }
    Ok(result)
}

pub fn count_events(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM fault_events", [], |row| row.get(0))
        .map_err(sqe)
}

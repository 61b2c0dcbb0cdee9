//! telemetry_snapshots queries.

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use faultline_core::types::snapshot::FieldBag;
use faultline_core::{ClockPolicy, Snapshot, StorageError};

use super::{from_millis, time_column, to_millis};
use crate::sqe;

const SNAPSHOT_COLUMNS: &str = "unit_key, group_key, sub_key, event_time, ingest_time, fields";

fn map_snapshot(row: &Row<'_>) -> rusqlite::Result<Snapshot> {
    let fields_json: String = row.get(5)?;
    let fields: FieldBag = serde_json::from_str(&fields_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(Snapshot {
        unit_key: row.get(0)?,
        group_key: row.get(1)?,
        sub_key: row.get(2)?,
        event_time: from_millis(3, row.get(3)?)?,
        ingest_time: from_millis(4, row.get(4)?)?,
        fields,
    })
}

/// Insert one snapshot. Returns `true` if it was new; a replay of the same
/// `(unit_key, event_time, ingest_time)` is ignored.
pub fn insert_snapshot(conn: &Connection, snapshot: &Snapshot) -> Result<bool, StorageError> {
    let fields = serde_json::to_string(&snapshot.fields).map_err(|e| StorageError::CorruptRow {
        details: format!("unserializable field bag for {}: {e}", snapshot.unit_key),
    })?;
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO telemetry_snapshots
             (unit_key, group_key, sub_key, event_time, ingest_time, fields)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (unit_key, event_time, ingest_time) DO NOTHING",
        )
        .map_err(sqe)?;
    let changed = stmt
        .execute(params![
            snapshot.unit_key,
            snapshot.group_key,
            snapshot.sub_key,
            to_millis(snapshot.event_time),
            to_millis(snapshot.ingest_time),
            fields,
        ])
        .map_err(sqe)?;
    Ok(changed == 1)
}

/// Newest snapshot per distinct unit, optionally restricted to one group.
///
/// The group filter applies after the per-unit pick, so a unit that moved
/// groups is reported under its current group only. Equal timestamps are
/// broken by insertion order (last written wins).
pub fn latest_per_unit(
    conn: &Connection,
    clock: ClockPolicy,
    group_key: Option<&str>,
) -> Result<Vec<Snapshot>, StorageError> {
    let col = time_column(clock);
    let sql = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM (
             SELECT {SNAPSHOT_COLUMNS},
                    ROW_NUMBER() OVER (PARTITION BY unit_key ORDER BY {col} DESC, id DESC) AS rn
             FROM telemetry_snapshots
         )
         WHERE rn = 1 AND (?1 IS NULL OR group_key = ?1)
         ORDER BY group_key, unit_key"
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(sqe)?;
    let rows = stmt.query_map(params![group_key], map_snapshot).map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(sqe)?);
    }
    Ok(result)
}

/// The newest snapshot of a single unit.
pub fn latest_for_unit(
    conn: &Connection,
    clock: ClockPolicy,
    unit_key: &str,
) -> Result<Option<Snapshot>, StorageError> {
    let col = time_column(clock);
    let sql = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM telemetry_snapshots
         WHERE unit_key = ?1
         ORDER BY {col} DESC, id DESC
         LIMIT 1"
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(sqe)?;
    match stmt.query_row(params![unit_key], map_snapshot) {
        Ok(s) => Ok(Some(s)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(sqe(e)),
    }
}

/// Most recent `limit` snapshots of a group across all its units.
pub fn recent_for_group(
    conn: &Connection,
    clock: ClockPolicy,
    group_key: &str,
    limit: usize,
) -> Result<Vec<Snapshot>, StorageError> {
    let col = time_column(clock);
    let sql = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM telemetry_snapshots
         WHERE group_key = ?1
         ORDER BY {col} DESC, id DESC
         LIMIT ?2"
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare_cached(&sql).map_err(sqe)?;
    let rows = stmt
        .query_map(params![group_key, limit], map_snapshot)
        .map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(sqe)?);
    }
    Ok(result)
}

pub fn count_snapshots(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM telemetry_snapshots", [], |row| row.get(0))
        .map_err(sqe)
}

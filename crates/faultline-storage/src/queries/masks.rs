//! fault_masks queries.

use rusqlite::{params, Connection, Row};

use faultline_core::{MaskRecord, MaskResolution, StorageError};

use super::{from_millis, to_millis};
use crate::sqe;

fn map_mask(row: &Row<'_>) -> rusqlite::Result<MaskRecord> {
    Ok(MaskRecord {
        unit_key: row.get(0)?,
        fault_code: row.get(1)?,
        masked_at: from_millis(2, row.get(2)?)?,
    })
}

/// Insert-if-absent. An existing mask keeps its original `masked_at`.
pub fn insert_mask(conn: &Connection, mask: &MaskRecord) -> Result<bool, StorageError> {
    let changed = conn
        .execute(
            "INSERT INTO fault_masks (unit_key, fault_code, masked_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (unit_key, fault_code) DO NOTHING",
            params![mask.unit_key, mask.fault_code, to_millis(mask.masked_at)],
        )
        .map_err(sqe)?;
    Ok(changed == 1)
}

pub fn list_masks(conn: &Connection) -> Result<Vec<MaskRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, fault_code, masked_at FROM fault_masks
             ORDER BY unit_key, fault_code",
        )
        .map_err(sqe)?;
    let rows = stmt.query_map([], map_mask).map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(sqe)?);
    }
    Ok(result)
}

pub fn masks_for_unit(conn: &Connection, unit_key: &str) -> Result<Vec<MaskRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT unit_key, fault_code, masked_at FROM fault_masks
             WHERE unit_key = ?1 ORDER BY fault_code",
        )
        .map_err(sqe)?;
    let rows = stmt.query_map(params![unit_key], map_mask).map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(sqe)?);
    }
    Ok(result)
}

/// Delete the resolved masks in one transaction.
///
/// A mask whose `masked_at` is newer than the resolution's `observed_at` was
/// re-issued after the clearing observation and is kept.
pub fn delete_resolved(
    conn: &Connection,
    resolutions: &[MaskResolution],
) -> Result<usize, StorageError> {
    if resolutions.is_empty() {
        return Ok(0);
    }
    let tx = conn.unchecked_transaction().map_err(sqe)?;
    let mut removed = 0;
    {
        let mut stmt = tx
            .prepare_cached(
                "DELETE FROM fault_masks
                 WHERE unit_key = ?1 AND fault_code = ?2 AND masked_at <= ?3",
            )
            .map_err(sqe)?;
        for r in resolutions {
            removed += stmt
                .execute(params![r.unit_key, r.fault_code, to_millis(r.observed_at)])
                .map_err(sqe)?;
        }
    }
    tx.commit().map_err(sqe)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::migrations::migrate(&conn).unwrap();
        conn
    }

    fn mask(unit: &str, code: &str, at: DateTime<Utc>) -> MaskRecord {
        MaskRecord {
            unit_key: unit.into(),
            fault_code: code.into(),
            masked_at: at,
        }
    }

    #[test]
    fn test_insert_is_idempotent_and_keeps_first_time() {
        let conn = conn();
        let t = Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap();
        assert!(insert_mask(&conn, &mask("U1", "BfltFadU11", t)).unwrap());
        assert!(!insert_mask(&conn, &mask("U1", "BfltFadU11", t + Duration::hours(1))).unwrap());

        let all = list_masks(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].masked_at, t);
    }

    #[test]
    fn test_delete_respects_masked_at() {
        let conn = conn();
        let t = Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap();
        insert_mask(&conn, &mask("U1", "A", t)).unwrap();
        insert_mask(&conn, &mask("U1", "B", t + Duration::minutes(10))).unwrap();

        let resolutions = vec![
            MaskResolution { unit_key: "U1".into(), fault_code: "A".into(), observed_at: t + Duration::minutes(5) },
            MaskResolution { unit_key: "U1".into(), fault_code: "B".into(), observed_at: t + Duration::minutes(5) },
            MaskResolution { unit_key: "U1".into(), fault_code: "missing".into(), observed_at: t },
        ];
        assert_eq!(delete_resolved(&conn, &resolutions).unwrap(), 1);

        let left = masks_for_unit(&conn, "U1").unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].fault_code, "B");
    }

    #[test]
    fn test_masks_for_unit_scopes_by_unit() {
        let conn = conn();
        let t = Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap();
        insert_mask(&conn, &mask("U1", "A", t)).unwrap();
        insert_mask(&conn, &mask("U2", "A", t)).unwrap();
        assert_eq!(masks_for_unit(&conn, "U2").unwrap().len(), 1);
        assert!(masks_for_unit(&conn, "U3").unwrap().is_empty());
    }
}

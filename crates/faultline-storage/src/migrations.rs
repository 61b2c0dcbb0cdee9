//! Schema versioning through a dedicated single-row version table.
//!
//! Each version bump is a const SQL string applied in order.

use rusqlite::Connection;
use tracing::info;

use faultline_core::StorageError;

use crate::schema::FAULTLINE_TABLES_V1;
use crate::sqe;

/// Current schema version. Bump this when adding new migrations.
pub const CURRENT_VERSION: u32 = 1;

/// Read the schema version. A database without the version table is v0.
pub fn get_schema_version(conn: &Connection) -> Result<u32, StorageError> {
    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='faultline_schema_version'",
            [],
            |row| row.get(0),
        )
        .map_err(sqe)?;
    if !exists {
        return Ok(0);
    }

    match conn.query_row(
        "SELECT version FROM faultline_schema_version LIMIT 1",
        [],
        |row| row.get::<_, u32>(0),
    ) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(sqe(e)),
    }
}

fn set_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS faultline_schema_version (
            version INTEGER NOT NULL
        ) STRICT;",
    )?;
    conn.execute("DELETE FROM faultline_schema_version", [])?;
    conn.execute(
        "INSERT INTO faultline_schema_version (version) VALUES (?1)",
        rusqlite::params![version],
    )?;
    Ok(())
}

/// Run all pending migrations. Returns the version the database ends at.
pub fn migrate(conn: &Connection) -> Result<u32, StorageError> {
    let current = get_schema_version(conn)?;
    if current >= CURRENT_VERSION {
        return Ok(current);
    }

    if current < 1 {
        info!("Migrating faultline schema: 0 → 1 (initial tables)");
        conn.execute_batch(FAULTLINE_TABLES_V1)
            .and_then(|_| set_schema_version(conn, 1))
            .map_err(|e| StorageError::MigrationFailed {
                version: 1,
                message: e.to_string(),
            })?;
    }

    let final_version = get_schema_version(conn)?;
    info!(from = current, to = final_version, "Faultline schema migration complete");
    Ok(final_version)
}

//! Schema SQL constants, applied by `migrations.rs`.
//!
//! Timestamps are stored as INTEGER epoch milliseconds so both clock columns
//! index and compare natively. The field bag is stored as JSON text.

/// V1 schema: snapshots, event log, masks + indexes.
pub const FAULTLINE_TABLES_V1: &str = "
    CREATE TABLE IF NOT EXISTS telemetry_snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        unit_key TEXT NOT NULL,
        group_key TEXT NOT NULL,
        sub_key INTEGER NOT NULL,
        event_time INTEGER NOT NULL,
        ingest_time INTEGER NOT NULL,
        fields TEXT NOT NULL,
        UNIQUE (unit_key, event_time, ingest_time)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS fault_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        unit_key TEXT NOT NULL,
        group_key TEXT NOT NULL,
        sub_key INTEGER NOT NULL,
        fault_code TEXT NOT NULL,
        fault_name TEXT NOT NULL,
        severity INTEGER NOT NULL,
        event_type TEXT NOT NULL,
        event_time INTEGER NOT NULL,
        ingest_time INTEGER NOT NULL,
        UNIQUE (event_time, unit_key, fault_code)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS fault_masks (
        unit_key TEXT NOT NULL,
        fault_code TEXT NOT NULL,
        masked_at INTEGER NOT NULL,
        PRIMARY KEY (unit_key, fault_code)
    ) STRICT;

    CREATE INDEX IF NOT EXISTS idx_snapshots_unit_event
        ON telemetry_snapshots(unit_key, event_time DESC);
    CREATE INDEX IF NOT EXISTS idx_snapshots_unit_ingest
        ON telemetry_snapshots(unit_key, ingest_time DESC);
    CREATE INDEX IF NOT EXISTS idx_snapshots_group
        ON telemetry_snapshots(group_key);
    CREATE INDEX IF NOT EXISTS idx_events_event_time
        ON fault_events(event_time);
    CREATE INDEX IF NOT EXISTS idx_events_ingest_time
        ON fault_events(ingest_time);
    CREATE INDEX IF NOT EXISTS idx_events_type_group
        ON fault_events(event_type, group_key);
";

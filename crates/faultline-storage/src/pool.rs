//! ConnectionPool: one serialized writer plus a round-robin read pool.
//!
//! The only place in the storage crate that holds `Mutex<Connection>`.
//! Everything above it goes through `SqliteFaultStore`.
//!
//! Every connection is configured here right after opening. The writer owns
//! the journal mode; readers are `query_only` so a dashboard read can never
//! touch the mask table.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use faultline_core::StorageError;

use crate::{migrations, sqe};

/// Default number of reader connections.
const DEFAULT_READ_POOL_SIZE: usize = 2;

/// Ingestion batches hold the writer briefly; readers wait this long on a
/// checkpoint before surfacing `DbBusy`.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// What a connection is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    /// Ingestion, mask writes and the reconcile delete.
    Writer,
    /// Snapshot, event and mask reads.
    Reader,
}

/// Apply the PRAGMAs for `role`. Must run before any other statement.
pub fn configure(conn: &Connection, role: ConnectionRole) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(u64::from(BUSY_TIMEOUT_MS)))?;
    match role {
        ConnectionRole::Writer => {
            // Snapshot rows are re-derivable from the bus; NORMAL is enough
            // under WAL. Mask writes commit in their own transaction.
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA temp_store = MEMORY;
                ",
            )
        }
        ConnectionRole::Reader => {
            // The latest-per-unit window query sorts in temp space.
            conn.execute_batch(
                "
                PRAGMA temp_store = MEMORY;
                PRAGMA cache_size = -16000;
                PRAGMA query_only = ON;
                ",
            )
        }
    }
}

/// 1 writer + N readers over one database file.
pub struct ConnectionPool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
}

impl ConnectionPool {
    /// Open a file-backed pool.
    ///
    /// The writer is opened, configured for WAL and migrated before any reader
    /// is attached, so readers always see the current schema.
    pub fn open(path: &Path, read_pool_size: usize) -> Result<Self, StorageError> {
        let pool_size = if read_pool_size == 0 {
            DEFAULT_READ_POOL_SIZE
        } else {
            read_pool_size
        };

        let writer = Connection::open(path).map_err(|e| StorageError::OpenFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        configure(&writer, ConnectionRole::Writer).map_err(sqe)?;
        migrations::migrate(&writer)?;

        let mut readers = Vec::with_capacity(pool_size);
        for i in 0..pool_size {
            let reader = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| StorageError::OpenFailed {
                path: path.display().to_string(),
                message: format!("reader {i}: {e}"),
            })?;
            configure(&reader, ConnectionRole::Reader).map_err(sqe)?;
            readers.push(Mutex::new(reader));
        }

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            read_index: AtomicUsize::new(0),
        })
    }

    /// Open an in-memory pool.
    ///
    /// Separate `open_in_memory()` connections never share data, so there are
    /// no readers here and `with_reader` falls back to the writer.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let writer = Connection::open_in_memory().map_err(|e| StorageError::OpenFailed {
            path: ":memory:".into(),
            message: e.to_string(),
        })?;
        configure(&writer, ConnectionRole::Writer).map_err(sqe)?;
        migrations::migrate(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
        })
    }

    /// Execute a closure with the writer connection.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let conn = self.writer.lock().map_err(|e| StorageError::LockPoisoned {
            what: format!("writer: {e}"),
        })?;
        f(&conn)
    }

    /// Execute a closure with a reader connection (round-robin).
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }

        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[index]
            .lock()
            .map_err(|e| StorageError::LockPoisoned {
                what: format!("reader {index}: {e}"),
            })?;
        f(&conn)
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Check WAL mode on the writer connection.
    pub fn is_wal_mode(&self) -> bool {
        self.with_writer(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_default();
            Ok(mode.eq_ignore_ascii_case("wal"))
        })
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sets_busy_timeout() {
        let conn = Connection::open_in_memory().unwrap();
        configure(&conn, ConnectionRole::Writer).unwrap();
        let timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, i64::from(BUSY_TIMEOUT_MS));

        // In-memory databases report "memory" instead of "wal"
        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert!(mode == "wal" || mode == "memory", "unexpected journal mode {mode}");
    }

    #[test]
    fn test_reader_role_is_query_only() {
        let conn = Connection::open_in_memory().unwrap();
        configure(&conn, ConnectionRole::Reader).unwrap();
        assert!(conn.execute_batch("CREATE TABLE t (x INTEGER)").is_err());
    }

    #[test]
    fn test_in_memory_pool_reads_through_writer() {
        let pool = ConnectionPool::open_in_memory().unwrap();
        assert_eq!(pool.reader_count(), 0);
        let n: i64 = pool
            .with_reader(|conn| {
                conn.query_row("SELECT COUNT(*) FROM fault_masks", [], |r| r.get(0))
                    .map_err(sqe)
            })
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_file_pool_uses_wal_and_readers() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&dir.path().join("pool.db"), 3).unwrap();
        assert_eq!(pool.reader_count(), 3);
        assert!(pool.is_wal_mode());
    }

    #[test]
    fn test_zero_pool_size_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&dir.path().join("pool.db"), 0).unwrap();
        assert_eq!(pool.reader_count(), DEFAULT_READ_POOL_SIZE);
    }

    #[test]
    fn test_readers_reject_writes() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&dir.path().join("pool.db"), 1).unwrap();
        let result = pool.with_reader(|conn| {
            conn.execute("DELETE FROM fault_masks", []).map_err(sqe)
        });
        assert!(result.is_err());
    }
}

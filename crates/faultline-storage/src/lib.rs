//! # faultline-storage
//!
//! SQLite persistence layer for the Faultline engine.
//! WAL mode, write-serialized + read-pooled, schema migrations, and the
//! clock-aware "latest snapshot" and event range queries.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod schema;

pub use engine::SqliteFaultStore;
pub use migrations::migrate;
pub use pool::{configure, ConnectionPool, ConnectionRole};

use faultline_core::StorageError;

/// Map a rusqlite error onto the core storage error.
pub(crate) fn sqe(e: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        if err.code == rusqlite::ffi::ErrorCode::DatabaseBusy
            || err.code == rusqlite::ffi::ErrorCode::DatabaseLocked
        {
            return StorageError::DbBusy;
        }
    }
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

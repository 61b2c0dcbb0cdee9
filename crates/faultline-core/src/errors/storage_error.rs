//! Storage-layer errors for SQLite operations.

use super::error_code::{self, FaultlineErrorCode};

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Failed to open database at {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Database busy (another operation in progress)")]
    DbBusy,

    #[error("Connection lock poisoned: {what}")]
    LockPoisoned { what: String },

    #[error("Stored row is corrupt: {details}")]
    CorruptRow { details: String },
}

impl FaultlineErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DbBusy => error_code::DB_BUSY,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::OpenFailed { .. } | Self::LockPoisoned { .. } => error_code::STORAGE_UNAVAILABLE,
            _ => error_code::STORAGE_ERROR,
        }
    }
}

//! Stable string codes for errors that cross the transport boundary.

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const STORAGE_UNAVAILABLE: &str = "STORAGE_UNAVAILABLE";
pub const DB_BUSY: &str = "DB_BUSY";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const MALFORMED_SNAPSHOT: &str = "MALFORMED_SNAPSHOT";
pub const INVALID_MASK_REQUEST: &str = "INVALID_MASK_REQUEST";
pub const INVALID_TIME_RANGE: &str = "INVALID_TIME_RANGE";
pub const MALFORMED_MESSAGE: &str = "MALFORMED_MESSAGE";
pub const DEADLINE_EXCEEDED: &str = "DEADLINE_EXCEEDED";
pub const REGISTRY_ERROR: &str = "REGISTRY_ERROR";

/// Implemented by every error enum that can surface to a caller.
pub trait FaultlineErrorCode {
    fn error_code(&self) -> &'static str;
}

//! Engine error types.

pub mod recovery;

use faultline_core::errors::error_code::{self, FaultlineErrorCode};
use faultline_core::errors::ConfigError;
use faultline_core::types::message::MessageError;
use faultline_core::StorageError;

use crate::registry::RegistryError;

pub use recovery::RecoveryAction;

#[derive(Debug, thiserror::Error)]
pub enum FaultError {
    #[error("Storage unavailable during {operation}: {source}")]
    StorageUnavailable {
        operation: &'static str,
        source: StorageError,
    },

    #[error("Malformed snapshot for {unit_key}: field {field}: {reason}")]
    MalformedSnapshot {
        unit_key: String,
        field: String,
        reason: String,
    },

    #[error("Invalid mask request: {0}")]
    InvalidMaskRequest(String),

    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("Deadline exceeded during {phase} (budget {budget_ms} ms)")]
    DeadlineExceeded { phase: &'static str, budget_ms: u64 },

    #[error("Malformed message: {0}")]
    Message(#[from] MessageError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FaultError {
    /// Wrap a storage failure with the operation that hit it.
    pub fn storage(operation: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::StorageUnavailable { operation, source }
    }
}

impl From<StorageError> for FaultError {
    fn from(source: StorageError) -> Self {
        Self::StorageUnavailable {
            operation: "storage",
            source,
        }
    }
}

impl FaultlineErrorCode for FaultError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::StorageUnavailable { source, .. } => source.error_code(),
            Self::MalformedSnapshot { .. } => error_code::MALFORMED_SNAPSHOT,
            Self::InvalidMaskRequest(_) => error_code::INVALID_MASK_REQUEST,
            Self::InvalidTimeRange { .. } => error_code::INVALID_TIME_RANGE,
            Self::DeadlineExceeded { .. } => error_code::DEADLINE_EXCEEDED,
            Self::Message(_) => error_code::MALFORMED_MESSAGE,
            Self::Registry(_) => error_code::REGISTRY_ERROR,
            Self::Config(e) => e.error_code(),
        }
    }
}

pub type FaultResult<T> = Result<T, FaultError>;

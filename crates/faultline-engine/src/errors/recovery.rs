//! RecoveryAction: what the caller should do when an engine operation fails.
//!
//! The engine never retries internally. This classification is advice for
//! the transport layer.

use std::fmt;

use faultline_core::StorageError;

use super::FaultError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Transient; the same request may succeed if repeated.
    Retry,
    /// The request itself is wrong; repeating it will not help.
    Reject,
    /// Needs an operator: broken storage, bad config or registry.
    Escalate,
    /// Logged and skipped; the operation still produced a result.
    Ignore,
}

impl RecoveryAction {
    pub fn for_error(error: &FaultError) -> Self {
        match error {
            FaultError::StorageUnavailable { source, .. } => match source {
                StorageError::DbBusy => Self::Retry,
                _ => Self::Escalate,
            },
            FaultError::DeadlineExceeded { .. } => Self::Retry,
            FaultError::InvalidMaskRequest(_) | FaultError::InvalidTimeRange { .. } => Self::Reject,
            FaultError::Message(_) => Self::Reject,
            FaultError::MalformedSnapshot { .. } => Self::Ignore,
            FaultError::Registry(_) | FaultError::Config(_) => Self::Escalate,
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "Retry"),
            Self::Reject => write!(f, "Reject"),
            Self::Escalate => write!(f, "Escalate"),
            Self::Ignore => write!(f, "Ignore"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_is_retryable() {
        let err = FaultError::from(StorageError::DbBusy);
        assert_eq!(RecoveryAction::for_error(&err), RecoveryAction::Retry);
    }

    #[test]
    fn test_bad_sql_escalates() {
        let err = FaultError::from(StorageError::SqliteError {
            message: "no such table".into(),
        });
        assert_eq!(RecoveryAction::for_error(&err), RecoveryAction::Escalate);
    }

    #[test]
    fn test_deadline_is_retryable() {
        let err = FaultError::DeadlineExceeded {
            phase: "reconcile",
            budget_ms: 10,
        };
        assert_eq!(RecoveryAction::for_error(&err), RecoveryAction::Retry);
        assert_eq!(RecoveryAction::for_error(&err).to_string(), "Retry");
    }
}

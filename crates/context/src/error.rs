//! Error types for the task runner.

use thiserror::Error;

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CancelReason {
    /// The cancel trigger was called
    #[error("context canceled")]
    Canceled,

    /// The context's deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors returned by runner operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The context was done before the work finished
    #[error(transparent)]
    Cancelled(#[from] CancelReason),

    /// The task itself failed; the error is passed through unchanged
    #[error(transparent)]
    Task(anyhow::Error),

    /// The task panicked
    #[error("task panicked: {0}")]
    TaskPanicked(String),
}

impl ContextError {
    /// The cancellation reason, if this error came from the context.
    pub fn reason(&self) -> Option<CancelReason> {
        match self {
            ContextError::Cancelled(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Whether this error came from the context rather than the task.
    pub fn is_cancellation(&self) -> bool {
        self.reason().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_messages() {
        assert_eq!(CancelReason::Canceled.to_string(), "context canceled");
        assert_eq!(
            CancelReason::DeadlineExceeded.to_string(),
            "context deadline exceeded"
        );
    }

    #[test]
    fn test_task_error_passes_through() {
        let err = ContextError::Task(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert!(err.reason().is_none());
        assert!(!err.is_cancellation());
    }

    #[test]
    fn test_from_reason() {
        let err: ContextError = CancelReason::DeadlineExceeded.into();
        assert_eq!(err.reason(), Some(CancelReason::DeadlineExceeded));
        assert_eq!(err.to_string(), "context deadline exceeded");
    }
}

//! Error types for guarded execution.

use std::time::Duration;

use thiserror::Error;

/// Error returned by a guarded operation or its fallback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    /// The request itself was invalid. Not counted as an error.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The operation failed.
    #[error("{0}")]
    Failed(String),
}

impl OperationError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        OperationError::BadRequest(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        OperationError::Failed(msg.into())
    }
}

/// Errors surfaced by `Circuit::execute`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CircuitError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("operation failed: {0}")]
    Failed(String),

    /// The circuit's own execution timeout fired.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's deadline expired, or it cancelled, before the operation
    /// finished.
    #[error("operation interrupted by caller")]
    Interrupted,

    #[error("circuit is open")]
    ShortCircuited,

    #[error("concurrency limit reached")]
    ConcurrencyRejected,

    #[error("fallback failed: {fallback} (primary: {primary})")]
    FallbackFailed {
        primary: Box<CircuitError>,
        fallback: OperationError,
    },

    #[error("fallback concurrency limit reached (primary: {primary})")]
    FallbackRejected { primary: Box<CircuitError> },

    #[error("fallback interrupted by caller (primary: {primary})")]
    FallbackInterrupted { primary: Box<CircuitError> },
}

impl CircuitError {
    /// Whether a fallback should run after this primary error.
    ///
    /// Bad requests and interrupts are returned as-is.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            CircuitError::Failed(_)
                | CircuitError::Timeout(_)
                | CircuitError::ShortCircuited
                | CircuitError::ConcurrencyRejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_fallback() {
        assert!(CircuitError::Failed("x".into()).allows_fallback());
        assert!(CircuitError::Timeout(Duration::from_secs(1)).allows_fallback());
        assert!(!CircuitError::BadRequest("x".into()).allows_fallback());
        assert!(!CircuitError::Interrupted.allows_fallback());
    }

    #[test]
    fn test_fallback_error_message() {
        let err = CircuitError::FallbackFailed {
            primary: Box::new(CircuitError::Failed("db down".into())),
            fallback: OperationError::failed("cache miss"),
        };
        assert_eq!(
            err.to_string(),
            "fallback failed: cache miss (primary: operation failed: db down)"
        );

        let err = CircuitError::FallbackInterrupted {
            primary: Box::new(CircuitError::Timeout(Duration::from_millis(20))),
        };
        assert_eq!(
            err.to_string(),
            "fallback interrupted by caller (primary: operation timed out after 20ms)"
        );
    }
}

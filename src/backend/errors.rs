//! Backend error types

use thiserror::Error;

/// Result type for backend calls
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors returned by a table store backend.
///
/// The message carries the backend's own wording so callers can surface it
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Table does not exist
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Request rejected by backend validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Request throttled
    #[error("request throttled: {0}")]
    Throttled(String),

    /// Could not reach the backend
    #[error("transport failure: {0}")]
    Transport(String),

    /// Any other service-side failure
    #[error("service error: {0}")]
    Service(String),
}

impl BackendError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::TableNotFound(_) => "BACKEND_TABLE_NOT_FOUND",
            BackendError::Validation(_) => "BACKEND_VALIDATION",
            BackendError::Throttled(_) => "BACKEND_THROTTLED",
            BackendError::Transport(_) => "BACKEND_TRANSPORT",
            BackendError::Service(_) => "BACKEND_SERVICE",
        }
    }
}

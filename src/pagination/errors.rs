//! Pagination error types

use thiserror::Error;

use crate::backend::BackendError;

/// Result type for pagination operations
pub type PageResult<T> = Result<T, PageError>;

/// Errors produced while assembling a page.
///
/// Token and filter errors are raised before any backend call is issued.
/// Backend failures abort the page; no partial page is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// An underlying chunk call failed
    #[error("backend request failed: {0}")]
    BackendRequestFailed(#[from] BackendError),

    /// Malformed or schema-mismatched key token
    #[error("invalid key token: {0}")]
    InvalidKeyToken(String),

    /// Filter value could not be coerced to the attribute's declared type
    #[error("invalid filter value {value:?} for attribute '{attribute}': {reason}")]
    InvalidFilterValue {
        attribute: String,
        value: String,
        reason: String,
    },

    /// Record lacks a key attribute
    #[error("record is missing key attribute '{0}'")]
    MissingKeyAttribute(String),

    /// Page size below 1
    #[error("invalid page size {0}: must be at least 1")]
    InvalidPageSize(usize),

    /// Caller cancelled the scan
    #[error("scan cancelled")]
    Cancelled,

    /// Caller deadline elapsed during a chunk call
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl PageError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PageError::BackendRequestFailed(_) => "BACKEND_REQUEST_FAILED",
            PageError::InvalidKeyToken(_) => "INVALID_KEY_TOKEN",
            PageError::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            PageError::MissingKeyAttribute(_) => "MISSING_KEY_ATTRIBUTE",
            PageError::InvalidPageSize(_) => "INVALID_PAGE_SIZE",
            PageError::Cancelled => "SCAN_CANCELLED",
            PageError::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    pub(crate) fn invalid_token(reason: impl Into<String>) -> Self {
        PageError::InvalidKeyToken(reason.into())
    }

    pub(crate) fn invalid_filter(attribute: &str, value: &str, reason: impl Into<String>) -> Self {
        PageError::InvalidFilterValue {
            attribute: attribute.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_converts() {
        let err: PageError = BackendError::Throttled("slow down".into()).into();
        assert_eq!(err.code(), "BACKEND_REQUEST_FAILED");
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn test_filter_error_display() {
        let err = PageError::invalid_filter("age", "abc", "not a number");
        assert_eq!(
            err.to_string(),
            "invalid filter value \"abc\" for attribute 'age': not a number"
        );
        assert_eq!(err.code(), "INVALID_FILTER_VALUE");
    }
}

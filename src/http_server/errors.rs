//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;
use crate::pagination::PageError;
use crate::value::ValueError;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
}

/// Errors returned by admin API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl From<ValueError> for ApiError {
    fn from(e: ValueError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Page(err) => match err {
                PageError::BackendRequestFailed(cause) => backend_status(cause),
                PageError::InvalidKeyToken(_)
                | PageError::InvalidFilterValue { .. }
                | PageError::InvalidPageSize(_) => StatusCode::BAD_REQUEST,
                PageError::MissingKeyAttribute(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PageError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                PageError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            },
            ApiError::Backend(cause) => backend_status(cause),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Page(err) => err.code(),
            ApiError::Backend(err) => err.code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
        }
    }
}

fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::TableNotFound(_) => StatusCode::NOT_FOUND,
        BackendError::Validation(_) => StatusCode::BAD_REQUEST,
        BackendError::Throttled(_) | BackendError::Transport(_) | BackendError::Service(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
            kind: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

//! Maps the shared error taxonomy onto HTTP responses (Section 6/7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("not found")]
    NotFound,
}

impl From<sa_domain::error::Error> for ApiError {
    fn from(e: sa_domain::error::Error) -> Self {
        match e {
            sa_domain::error::Error::InvalidRequest(m) => ApiError::InvalidRequest(m),
            sa_domain::error::Error::Unauthorized(m) => ApiError::Unauthorized(m),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidRequest(m) => (StatusCode::BAD_REQUEST, "invalid_request", m.clone()),
            ApiError::Unauthorized(m) => (StatusCode::FORBIDDEN, "unauthorized", m.clone()),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", m.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", "not found".to_string()),
        };
        (status, Json(ErrorBody { code, message })).into_response()
    }
}

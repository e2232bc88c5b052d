//! Shared error type used across every crate in this workspace.
//!
//! Variants map directly onto the error taxonomy: each carries a wire
//! `code()` so a caller (the Gateway's HTTP layer, an Event's `Error` field)
//! can classify a failure without string matching on the message.

/// Closed set of error kinds an orchestration pipeline can surface.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("canceled")]
    Canceled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The wire-level error code, as it appears on `Event.Error.code`.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) => "invalid_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::Model(_) => "model_error",
            Error::Tool(_) => "tool_error",
            Error::Storage(_) => "storage_error",
            Error::Canceled => "canceled",
            Error::Internal(_) | Error::Io(_) | Error::Json(_) => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

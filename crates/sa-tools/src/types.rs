//! Core types for tool handling: context, declaration, and errors.

use sa_domain::error::Error as DomainError;
pub use sa_domain::message::ToolDeclaration;

/// Context provided to every tool invocation.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Correlates with the matching `tool_response` event.
    pub call_id: String,
    pub tool_name: String,
    pub invocation_id: String,
    pub request_id: String,
}

pub type ToolResult = Result<serde_json::Value, ToolError>;

/// Errors a tool handler can return. `Display` feeds directly into the
/// `tool_error` event's message (Section 4.3).
#[derive(thiserror::Error, Debug, Clone)]
pub enum ToolError {
    #[error("invalid_args: {0}")]
    InvalidArgs(String),
    #[error("not_found: {0}")]
    NotFound(String),
    #[error("failed: {0}")]
    Failed(String),
    #[error("timeout: {0}")]
    Timeout(String),
}

impl From<ToolError> for DomainError {
    fn from(e: ToolError) -> Self {
        DomainError::Tool(e.to_string())
    }
}

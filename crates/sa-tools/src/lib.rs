//! Tool calling (C3).
//!
//! `Tool` is the pluggable-handler contract; `ToolRegistry` holds the set
//! the Agent loop dispatches against. `AddTool` is the sample arithmetic
//! tool scenario S2 exercises.

pub mod add;
pub mod registry;
pub mod types;

pub use add::AddTool;
pub use registry::{Tool, ToolRegistry};
pub use types::{ToolContext, ToolDeclaration, ToolError, ToolResult};

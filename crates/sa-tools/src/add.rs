//! `add` — the sample arithmetic tool scenario S2 exercises.

use async_trait::async_trait;
use serde_json::Value;

use crate::registry::Tool;
use crate::types::{ToolContext, ToolDeclaration, ToolError, ToolResult};

pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "add".into(),
            description: "Adds two numbers and returns their sum.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "a": {"type": "number"},
                    "b": {"type": "number"}
                },
                "required": ["a", "b"]
            }),
            output_schema: Some(serde_json::json!({"type": "number"})),
        }
    }

    async fn call(&self, _ctx: ToolContext, args: Value) -> ToolResult {
        let a = args
            .get("a")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::InvalidArgs("missing or non-numeric field \"a\"".into()))?;
        let b = args
            .get("b")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::InvalidArgs("missing or non-numeric field \"b\"".into()))?;
        Ok(serde_json::json!(a + b))
    }
}

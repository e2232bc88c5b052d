//! Provider-agnostic message and tool-call types shared by the Model
//! capability, the Agent loop, and the Session event log.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single request to invoke a named tool, carried on an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlates with the matching `tool_response` event.
    pub id: String,
    pub function: ToolFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunctionCall {
    pub name: String,
    /// Raw JSON arguments. Parsing is the tool's responsibility; the Agent
    /// never inspects this beyond forwarding it.
    pub arguments: serde_json::Value,
}

/// A tool's JSON-schema declaration, as surfaced to the Model and over the
/// wire (`GET` tool listings, `ToolRegistry::declarations`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
}

/// A message in the conversation history or model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set when `role == Tool`: the `ToolCall.id` this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    /// Set when `role == Tool`: the tool name, for display/logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
            tool_calls: Vec::new(),
            tool_id: None,
            tool_name: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
            tool_calls: Vec::new(),
            tool_id: None,
            tool_name: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
            tool_calls: Vec::new(),
            tool_id: None,
            tool_name: None,
        }
    }

    pub fn assistant_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
            tool_calls,
            tool_id: None,
            tool_name: None,
        }
    }

    pub fn tool_result(tool_id: impl Into<String>, tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_id: Some(tool_id.into()),
            tool_name: Some(tool_name.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_carries_id_and_name() {
        let m = Message::tool_result("c1", "add", "5");
        assert_eq!(m.role, Role::Tool);
        assert_eq!(m.tool_id.as_deref(), Some("c1"));
        assert_eq!(m.tool_name.as_deref(), Some("add"));
        assert_eq!(m.content, "5");
    }

    #[test]
    fn assistant_tool_calls_round_trips_json() {
        let m = Message::assistant_tool_calls(
            "",
            vec![ToolCall {
                id: "c1".into(),
                function: ToolFunctionCall {
                    name: "add".into(),
                    arguments: serde_json::json!({"a": 2, "b": 3}),
                },
            }],
        );
        let json = serde_json::to_string(&m).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tool_calls.len(), 1);
        assert_eq!(back.tool_calls[0].function.name, "add");
    }
}

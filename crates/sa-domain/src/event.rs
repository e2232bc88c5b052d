//! The uniform envelope emitted for every observable step of an invocation.
//!
//! Grounded on the teacher's `TurnEvent` (`runtime/turn.rs`) and `RunEvent`
//! (`runtime/runs.rs`) enums, unified here into the single `Event` shape
//! Section 3 of the specification requires: one envelope type carrying an
//! `Object` discriminant rather than a family of purpose-specific enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, ToolCall};

/// What kind of step this event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventObject {
    ChatCompletion,
    ChatCompletionChunk,
    ToolResponse,
    Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::error::Error> for ErrorInfo {
    fn from(e: &crate::error::Error) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// Partial content for a streaming `chat_completion_chunk`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
}

impl Choice {
    pub fn message(message: Message) -> Self {
        Self {
            index: 0,
            message: Some(message),
            delta: None,
        }
    }

    pub fn delta(content: impl Into<String>) -> Self {
        Self {
            index: 0,
            message: None,
            delta: Some(Delta { content: content.into() }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub choices: Vec<Choice>,
}

/// The uniform, immutable envelope for every step an invocation emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub invocation_id: String,
    pub request_id: String,
    /// Agent name, tool name, or `"user"`.
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub object: EventObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub done: bool,
}

impl Event {
    pub fn new(invocation_id: impl Into<String>, request_id: impl Into<String>, author: impl Into<String>, object: EventObject) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            request_id: request_id.into(),
            author: author.into(),
            timestamp: Utc::now(),
            object,
            response: None,
            error: None,
            done: false,
        }
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    /// Whether this event is the one `Done=true` terminator Invariant 1
    /// requires: `Done` set, and not a tool-response event.
    pub fn is_terminal(&self) -> bool {
        self.done && self.object != EventObject::ToolResponse
    }

    /// Convenience: the assistant message text, if this event carries one.
    pub fn assistant_text(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|r| r.choices.first())
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.as_str())
    }

    /// Convenience: the tool calls requested by this event's assistant
    /// message, if any.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.response
            .as_ref()
            .and_then(|r| r.choices.first())
            .and_then(|c| c.message.as_ref())
            .map(|m| m.tool_calls.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn terminal_excludes_tool_response() {
        let e = Event::new("inv", "req", "tool:add", EventObject::ToolResponse).done(true);
        assert!(!e.is_terminal());

        let e = Event::new("inv", "req", "agent", EventObject::ChatCompletion).done(true);
        assert!(e.is_terminal());
    }

    #[test]
    fn assistant_text_reads_through_response() {
        let e = Event::new("inv", "req", "agent", EventObject::ChatCompletion)
            .with_response(Response { choices: vec![Choice::message(Message::assistant("hi"))] });
        assert_eq!(e.assistant_text(), Some("hi"));
    }

    #[test]
    fn event_json_round_trip() {
        let e = Event::new("inv", "req", "agent", EventObject::ChatCompletionChunk)
            .with_response(Response { choices: vec![Choice::delta("partial")] });
        let json = serde_json::to_string(&e).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.object, EventObject::ChatCompletionChunk);
        assert_eq!(back.response.unwrap().choices[0].delta.as_ref().unwrap().content, "partial");
    }
}

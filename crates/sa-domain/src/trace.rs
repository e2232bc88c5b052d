//! Structured trace events emitted across every crate in this workspace.
//!
//! One closed enum, one `emit()` call site — this is the sole ambient
//! logging surface; crates never call `tracing::info!` directly for a
//! milestone that has a `TraceEvent` variant.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    InvocationStarted {
        invocation_id: String,
        request_id: String,
        session_key: String,
    },
    InvocationFinished {
        invocation_id: String,
        request_id: String,
        status: String,
        loop_count: u32,
        duration_ms: u64,
    },
    SessionResolved {
        session_key: String,
        session_id: String,
        is_new: bool,
    },
    SessionAppendFailed {
        session_id: String,
        error: String,
    },
    SummarizerFired {
        session_id: String,
        reason: String,
    },
    SummarizerFailed {
        session_id: String,
        error: String,
    },
    LaneAcquired {
        session_id: String,
        waiters: usize,
    },
    LaneReleased {
        session_id: String,
    },
    ToolDispatched {
        invocation_id: String,
        call_id: String,
        tool_name: String,
        is_error: bool,
        duration_ms: u64,
    },
    ToolNotFound {
        invocation_id: String,
        tool_name: String,
    },
    ModelRequest {
        invocation_id: String,
        streaming: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    MemoryExtractionEnqueued {
        session_id: String,
    },
    MemoryExtractionDropped {
        session_id: String,
        reason: String,
    },
    MemoryExtractionFailed {
        session_id: String,
        error: String,
    },
    CancellationRequested {
        request_id: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "orchestration_event");
    }
}

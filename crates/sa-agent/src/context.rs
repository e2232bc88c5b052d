//! Context types threaded through the Agent/Model/Tool callback chains.

use sa_domain::message::Message;

#[derive(Debug, Clone)]
pub struct AgentContext {
    pub invocation_id: String,
    pub request_id: String,
}

#[derive(Debug, Clone)]
pub struct ModelCallContext {
    pub invocation_id: String,
    pub request_id: String,
    pub loop_index: usize,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone)]
pub struct ToolCallContext {
    pub invocation_id: String,
    pub request_id: String,
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

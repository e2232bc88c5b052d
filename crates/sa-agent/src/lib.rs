//! The tool-using reasoning loop (C7).
//!
//! Grounded on the teacher's `run_turn_inner`
//! (`crates/gateway/src/runtime/turn.rs`): a bounded loop that calls the
//! Model, forwards streamed deltas as they arrive, and — when the model's
//! final message carries tool calls — dispatches each one, appends the
//! results to the conversation, and loops again. The teacher's 25-iteration
//! cap becomes the configurable `max_tool_iterations` (Section 4.7); the
//! teacher's default-parallel `join_all` dispatch becomes serial-by-default
//! with an opt-in `parallel_tools` flag (Section 9, Ambiguity (a)).
//!
//! Unlike the teacher, this loop never touches session storage directly:
//! the Runner (C8) is responsible for loading history into
//! [`AgentRequest::messages`] and persisting emitted events afterward. That
//! keeps `sa-agent` a pure function of (messages, tools, model) and avoids
//! a dependency from the Agent back down to Session/Memory.

mod context;

pub use context::{AgentContext, ModelCallContext, ToolCallContext};

use std::sync::Arc;

use sa_callbacks::CallbackChain;
use sa_domain::error::{Error, Result};
use sa_domain::event::{ErrorInfo, Event, EventObject, Response};
use sa_domain::message::{Message, ToolCall};
use sa_domain::stream::BoxStream;
use sa_domain::trace::TraceEvent;
use sa_providers::{GenerateRequest, Model};
use sa_tools::ToolRegistry;

pub struct AgentRequest {
    pub context: AgentContext,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy)]
pub struct AgentConfig {
    pub max_tool_iterations: usize,
    pub parallel_tools: bool,
}

impl From<&sa_domain::config::AgentConfig> for AgentConfig {
    fn from(c: &sa_domain::config::AgentConfig) -> Self {
        Self { max_tool_iterations: c.max_tool_iterations, parallel_tools: c.parallel_tools }
    }
}

pub struct Agent {
    model: Arc<dyn Model>,
    tools: ToolRegistry,
    config: AgentConfig,
    agent_chain: CallbackChain<AgentContext, Event>,
    model_chain: CallbackChain<ModelCallContext, Message>,
    tool_chain: CallbackChain<ToolCallContext, serde_json::Value>,
}

impl Agent {
    pub fn new(model: Arc<dyn Model>, tools: ToolRegistry, config: AgentConfig) -> Self {
        Self {
            model,
            tools,
            config,
            agent_chain: CallbackChain::new(),
            model_chain: CallbackChain::new(),
            tool_chain: CallbackChain::new(),
        }
    }

    pub fn agent_chain_mut(&mut self) -> &mut CallbackChain<AgentContext, Event> {
        &mut self.agent_chain
    }

    pub fn model_chain_mut(&mut self) -> &mut CallbackChain<ModelCallContext, Message> {
        &mut self.model_chain
    }

    pub fn tool_chain_mut(&mut self) -> &mut CallbackChain<ToolCallContext, serde_json::Value> {
        &mut self.tool_chain
    }

    /// Runs one invocation to completion, returning a lazy stream of
    /// events: zero or more non-terminal events (deltas, tool responses)
    /// followed by exactly one terminal `Done=true` event (Invariant 1).
    pub async fn run(self: Arc<Self>, request: AgentRequest) -> Result<BoxStream<'static, Result<Event>>> {
        if let Some(event) = self.agent_chain.run_before(&request.context).await? {
            return Ok(Box::pin(futures_util::stream::once(async { Ok(event) })));
        }

        let stream = async_stream::stream! {
            let AgentRequest { context, mut messages } = request;
            let invocation_id = context.invocation_id.clone();
            let request_id = context.request_id.clone();

            let mut loop_index = 0usize;
            let terminal: Event = loop {
                if loop_index >= self.config.max_tool_iterations {
                    let error = Error::Internal(format!(
                        "max_tool_iterations ({}) exceeded without a final answer",
                        self.config.max_tool_iterations
                    ));
                    break status_event(&invocation_id, &request_id, &error);
                }

                let model_ctx = ModelCallContext {
                    invocation_id: invocation_id.clone(),
                    request_id: request_id.clone(),
                    loop_index,
                    messages: messages.clone(),
                };

                let message = match self.model_chain.run_before(&model_ctx).await {
                    Ok(Some(overridden)) => overridden,
                    Ok(None) => {
                        let started = std::time::Instant::now();
                        let generate = self.model.generate(GenerateRequest {
                            messages: messages.clone(),
                            tools: self.tools.declarations(),
                            ..Default::default()
                        }).await;

                        let mut chunks = match generate {
                            Ok(s) => s,
                            Err(e) => { yield Err(e); return; }
                        };

                        let mut final_message: Option<Message> = None;
                        let mut rolling_content = String::new();
                        let mut prompt_tokens = 0u32;
                        let mut completion_tokens = 0u32;

                        use futures_util::StreamExt;
                        while let Some(chunk) = chunks.next().await {
                            let chunk = match chunk {
                                Ok(c) => c,
                                Err(e) => { yield Err(e); return; }
                            };
                            if let Some(usage) = &chunk.usage {
                                prompt_tokens = usage.prompt_tokens;
                                completion_tokens = usage.completion_tokens;
                            }
                            match chunk.object {
                                EventObject::ChatCompletionChunk => {
                                    for choice in &chunk.choices {
                                        if let Some(delta) = &choice.delta {
                                            rolling_content.push_str(&delta.content);
                                        }
                                    }
                                    yield Ok(Event::new(&invocation_id, &request_id, "agent", EventObject::ChatCompletionChunk)
                                        .with_response(Response { choices: chunk.choices }));
                                }
                                EventObject::ChatCompletion => {
                                    final_message = chunk.choices.into_iter().find_map(|c| c.message);
                                }
                                _ => {}
                            }
                        }

                        TraceEvent::ModelRequest {
                            invocation_id: invocation_id.clone(),
                            streaming: true,
                            duration_ms: started.elapsed().as_millis() as u64,
                            prompt_tokens: Some(prompt_tokens),
                            completion_tokens: Some(completion_tokens),
                        }.emit();

                        // Spec 4.2 / Invariant 7: when the stream ends
                        // without a `chat_completion` final, the assistant
                        // message is built by concatenating the deltas
                        // seen so far rather than erroring.
                        let message = final_message.unwrap_or_else(|| Message::assistant(rolling_content));
                        self.model_chain.run_after(&model_ctx, message, None).await
                    }
                    Err(e) => { yield Err(e); return; }
                };

                messages.push(message.clone());

                let chat_event = Event::new(&invocation_id, &request_id, "agent", EventObject::ChatCompletion)
                    .with_response(Response { choices: vec![sa_domain::event::Choice::message(message.clone())] })
                    .done(message.tool_calls.is_empty());

                if message.tool_calls.is_empty() {
                    // This is the terminal event (Invariant 1) — hand it to
                    // run_after below rather than yielding it twice.
                    break chat_event;
                }

                yield Ok(chat_event);

                let results = self.dispatch_tool_calls(&invocation_id, &request_id, &message.tool_calls).await;
                for (call, value, is_error) in &results {
                    let tool_event = tool_response_event(&invocation_id, &request_id, call, value, *is_error);
                    yield Ok(tool_event);
                }
                for (call, value, _is_error) in results {
                    messages.push(Message::tool_result(call.id.clone(), call.function.name.clone(), value.to_string()));
                }

                loop_index += 1;
            };

            let terminal = self.agent_chain.run_after(&context, terminal, None).await;
            yield Ok(terminal);
        };

        Ok(Box::pin(stream))
    }

    async fn dispatch_tool_calls(
        &self,
        invocation_id: &str,
        request_id: &str,
        calls: &[ToolCall],
    ) -> Vec<(ToolCall, serde_json::Value, bool)> {
        if self.config.parallel_tools {
            let futures = calls.iter().map(|call| self.dispatch_one(invocation_id, request_id, call));
            futures_util::future::join_all(futures).await
        } else {
            let mut out = Vec::with_capacity(calls.len());
            for call in calls {
                out.push(self.dispatch_one(invocation_id, request_id, call).await);
            }
            out
        }
    }

    async fn dispatch_one(&self, invocation_id: &str, request_id: &str, call: &ToolCall) -> (ToolCall, serde_json::Value, bool) {
        let started = std::time::Instant::now();
        let ctx = ToolCallContext {
            invocation_id: invocation_id.to_string(),
            request_id: request_id.to_string(),
            call_id: call.id.clone(),
            tool_name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        };

        let before = self.tool_chain.run_before(&ctx).await;
        let (value, is_error) = match before {
            Ok(Some(overridden)) => (overridden, false),
            Ok(None) => match self.tools.get(&call.function.name) {
                None => {
                    TraceEvent::ToolNotFound { invocation_id: invocation_id.to_string(), tool_name: call.function.name.clone() }.emit();
                    (serde_json::json!({"error": format!("unknown tool: {}", call.function.name)}), true)
                }
                Some(tool) => {
                    let tool_ctx = sa_tools::ToolContext {
                        call_id: call.id.clone(),
                        tool_name: call.function.name.clone(),
                        invocation_id: invocation_id.to_string(),
                        request_id: request_id.to_string(),
                    };
                    match tool.call(tool_ctx, call.function.arguments.clone()).await {
                        Ok(v) => (v, false),
                        Err(e) => (serde_json::json!({"error": e.to_string()}), true),
                    }
                }
            },
            Err(e) => (serde_json::json!({"error": e.to_string()}), true),
        };

        let value = if is_error { value } else { self.tool_chain.run_after(&ctx, value, None).await };

        TraceEvent::ToolDispatched {
            invocation_id: invocation_id.to_string(),
            call_id: call.id.clone(),
            tool_name: call.function.name.clone(),
            is_error,
            duration_ms: started.elapsed().as_millis() as u64,
        }.emit();

        (call.clone(), value, is_error)
    }
}

fn status_event(invocation_id: &str, request_id: &str, error: &Error) -> Event {
    Event::new(invocation_id, request_id, "agent", EventObject::Status)
        .with_error(ErrorInfo::from(error))
        .done(true)
}

fn tool_response_event(invocation_id: &str, request_id: &str, call: &ToolCall, value: &serde_json::Value, is_error: bool) -> Event {
    let content = value.to_string();
    let message = Message::tool_result(call.id.clone(), call.function.name.clone(), content);
    let mut event = Event::new(invocation_id, request_id, format!("tool:{}", call.function.name), EventObject::ToolResponse)
        .with_response(Response { choices: vec![sa_domain::event::Choice::message(message)] });
    if is_error {
        event = event.with_error(ErrorInfo::new("tool_error", format!("tool {} failed", call.function.name)));
    }
    event
}

/// Reconstructs the model-facing conversation from a session's event log.
/// Grounded on the teacher's `transcript_lines_to_messages`
/// (`crates/gateway/src/runtime/mod.rs`): only events that carry a
/// completed message (`chat_completion`, `tool_response`) become history;
/// streaming chunks and status events are not replayed.
pub fn build_messages(events: &[Event]) -> Vec<Message> {
    events
        .iter()
        .filter(|e| matches!(e.object, EventObject::ChatCompletion | EventObject::ToolResponse))
        .filter_map(|e| e.response.as_ref()?.choices.first()?.message.clone())
        .collect()
}

//! `Runner` — binds an Agent to Session and Memory services (Section 4.8).
//!
//! Grounded on the teacher's top-level turn driver
//! (`crates/gateway/src/runtime/mod.rs`): assign IDs, load-or-create the
//! session, drive the Agent, persist every non-delta event as it is
//! observed, and — once the stream closes cleanly — fire the Summarizer
//! and memory extraction off the request path. Cancellation is handled
//! here rather than inside `sa-agent`: the Runner polls the caller's
//! `CancelToken` between events and, on a hit, stops polling the
//! underlying stream (dropping its `async_stream` generator cancels
//! whatever it was awaiting) and synthesizes the canceled terminal event
//! itself.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use sa_agent::{Agent, AgentContext, AgentRequest};
use sa_domain::error::{Error, Result};
use sa_domain::event::{Choice, ErrorInfo, Event, EventObject, Response};
use sa_domain::message::Message;
use sa_domain::stream::BoxStream;
use sa_domain::trace::TraceEvent;
use sa_memory::{ExtractionTrigger, MemoryExtractor};
use sa_sessions::{Session, SessionKey, Summarizer};
use uuid::Uuid;

use crate::cancel::CancelMap;
use crate::runs::{Run, RunStatus, RunStore};

/// One inbound turn: the text to append to a session plus enough routing
/// information to resolve or create that session.
pub struct InvokeRequest {
    pub user_id: String,
    pub session_id: String,
    pub text: String,
    /// Caller-supplied correlation ID; generated when absent (Section 4.8).
    pub request_id: Option<String>,
}

pub struct Runner {
    app_name: String,
    agent: Arc<Agent>,
    sessions: Arc<dyn sa_sessions::Service>,
    memory: Arc<dyn sa_memory::Service>,
    summarizer: Arc<dyn Summarizer>,
    memory_trigger: Arc<dyn ExtractionTrigger>,
    extractor: Option<Arc<MemoryExtractor>>,
    cancel_map: Arc<CancelMap>,
    runs: Arc<RunStore>,
}

impl Runner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<Agent>,
        sessions: Arc<dyn sa_sessions::Service>,
        memory: Arc<dyn sa_memory::Service>,
        summarizer: Arc<dyn Summarizer>,
        memory_trigger: Arc<dyn ExtractionTrigger>,
        extractor: Option<Arc<MemoryExtractor>>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            sessions,
            memory,
            summarizer,
            memory_trigger,
            extractor,
            cancel_map: Arc::new(CancelMap::new()),
            runs: Arc::new(RunStore::new()),
        }
    }

    /// `Runner.Cancel(requestID)` (Section 4.8).
    pub fn cancel(&self, request_id: &str) -> bool {
        TraceEvent::CancellationRequested { request_id: request_id.to_string() }.emit();
        self.cancel_map.cancel(request_id)
    }

    /// `Runner.RunStatus(requestID)` (Section 4.8).
    pub fn status(&self, request_id: &str) -> Option<Run> {
        self.runs.get(request_id)
    }

    pub async fn invoke(&self, request: InvokeRequest) -> Result<BoxStream<'static, Result<Event>>> {
        let request_id = request.request_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let invocation_id = Uuid::new_v4().to_string();
        let key = SessionKey::new(&self.app_name, &request.user_id, &request.session_id);

        TraceEvent::InvocationStarted {
            invocation_id: invocation_id.clone(),
            request_id: request_id.clone(),
            session_key: key.flatten(),
        }
        .emit();

        let session = match self.sessions.get_session(&key).await? {
            Some(s) => s,
            None => self.sessions.create_session(key.clone(), Default::default()).await?,
        };

        let mut messages = sa_agent::build_messages(&session.events);
        let user_message = Message::user(request.text);
        messages.push(user_message.clone());

        let user_event = Event::new(&invocation_id, &request_id, "user", EventObject::ChatCompletion)
            .with_response(Response { choices: vec![Choice::message(user_message)] })
            .done(false);
        self.sessions.append_event(&key, user_event).await?;

        self.runs.start(Run::new(request_id.clone(), invocation_id.clone(), key.flatten()));
        let token = self.cancel_map.register(&request_id);

        let inner = self
            .agent
            .clone()
            .run(AgentRequest {
                context: AgentContext { invocation_id: invocation_id.clone(), request_id: request_id.clone() },
                messages,
            })
            .await?;

        let sessions = self.sessions.clone();
        let memory = self.memory.clone();
        let summarizer = self.summarizer.clone();
        let memory_trigger = self.memory_trigger.clone();
        let extractor = self.extractor.clone();
        let runs = self.runs.clone();
        let cancel_map = self.cancel_map.clone();
        let started = Instant::now();

        let stream = async_stream::stream! {
            let mut inner = inner;
            let mut loop_count = 0u32;
            let mut final_status = RunStatus::Failed;

            loop {
                if token.is_cancelled() {
                    let canceled = Event::new(&invocation_id, &request_id, "agent", EventObject::Status)
                        .with_error(ErrorInfo::from(&Error::Canceled))
                        .done(true);
                    persist(&sessions, &key, &canceled).await;
                    final_status = RunStatus::Canceled;
                    yield Ok(canceled);
                    break;
                }

                match inner.next().await {
                    None => break,
                    Some(Err(e)) => {
                        let failed = Event::new(&invocation_id, &request_id, "agent", EventObject::Status)
                            .with_error(ErrorInfo::from(&e))
                            .done(true);
                        persist(&sessions, &key, &failed).await;
                        final_status = RunStatus::Failed;
                        yield Ok(failed);
                        break;
                    }
                    Some(Ok(event)) => {
                        if event.object != EventObject::ChatCompletionChunk {
                            persist(&sessions, &key, &event).await;
                        }
                        if event.object == EventObject::ToolResponse {
                            loop_count += 1;
                            runs.increment_loop_count(&request_id);
                        }
                        let is_terminal = event.is_terminal();
                        let had_error = event.error.is_some();
                        yield Ok(event);

                        if is_terminal {
                            final_status = if had_error { RunStatus::Failed } else { RunStatus::Succeeded };
                            break;
                        }
                    }
                }
            }

            runs.finish(&request_id, final_status, None);
            cancel_map.remove(&request_id);

            if final_status == RunStatus::Succeeded {
                maybe_extract_memory(&sessions, &memory, &summarizer, &memory_trigger, &extractor, &key).await;
            }

            TraceEvent::InvocationFinished {
                invocation_id: invocation_id.clone(),
                request_id: request_id.clone(),
                status: format!("{final_status:?}"),
                loop_count,
                duration_ms: started.elapsed().as_millis() as u64,
            }
            .emit();
        };

        Ok(Box::pin(stream))
    }
}

async fn persist(sessions: &Arc<dyn sa_sessions::Service>, key: &SessionKey, event: &Event) {
    if let Err(e) = sessions.append_event(key, event.clone()).await {
        TraceEvent::SessionAppendFailed { session_id: key.session_id.clone(), error: e.to_string() }.emit();
    }
}

async fn maybe_extract_memory(
    sessions: &Arc<dyn sa_sessions::Service>,
    memory: &Arc<dyn sa_memory::Service>,
    summarizer: &Arc<dyn Summarizer>,
    memory_trigger: &Arc<dyn ExtractionTrigger>,
    extractor: &Option<Arc<MemoryExtractor>>,
    key: &SessionKey,
) {
    let Ok(Some(session)) = sessions.get_session(key).await else { return };

    if summarizer.should_summarize(&session) {
        let transcript = transcript_text(&session);
        TraceEvent::SummarizerFired { session_id: key.session_id.clone(), reason: "threshold".into() }.emit();
        if let Err(e) = sessions.update_session_summary(key, transcript).await {
            TraceEvent::SummarizerFailed { session_id: key.session_id.clone(), error: e.to_string() }.emit();
        }
    }

    if memory_trigger.should_extract(session.event_count(), 0) {
        let content = transcript_text(&session);
        match extractor {
            Some(extractor) => extractor.enqueue(key.session_id.clone(), key.app_name.clone(), key.user_id.clone(), content),
            None => {
                let _ = memory.add_session_to_memory(&key.app_name, &key.user_id, &key.session_id, &content).await;
            }
        }
    }
}

fn transcript_text(session: &Session) -> String {
    session.events.iter().filter_map(|e| e.assistant_text()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sa_domain::capability::{LlmCapabilities, ToolSupport};
    use sa_domain::stream::ModelChunk;
    use sa_memory::{InMemoryMemoryService, ThresholdExtractionTrigger};
    use sa_providers::{GenerateRequest as GenReq, Model};
    use sa_sessions::{InMemorySessionService, ThresholdSummarizer};
    use sa_tools::ToolRegistry;
    use std::time::Duration;

    struct EchoModel;

    #[async_trait]
    impl Model for EchoModel {
        async fn generate(&self, request: GenReq) -> Result<BoxStream<'static, Result<ModelChunk>>> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            let reply = Message::assistant(format!("Echo: {last}"));
            let stream = futures_util::stream::once(async move { Ok(ModelChunk::final_message(reply, None)) });
            Ok(Box::pin(stream))
        }

        fn capabilities(&self) -> &LlmCapabilities {
            static CAPS: std::sync::OnceLock<LlmCapabilities> = std::sync::OnceLock::new();
            CAPS.get_or_init(|| LlmCapabilities { supports_tools: ToolSupport::Basic, supports_streaming: true, ..Default::default() })
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    /// Emits a delta, then sleeps, then emits the final message — enough of
    /// a gap for a test to land a cancellation between the two.
    struct SlowModel;

    #[async_trait]
    impl Model for SlowModel {
        async fn generate(&self, _request: GenReq) -> Result<BoxStream<'static, Result<ModelChunk>>> {
            let stream = async_stream::stream! {
                yield Ok(ModelChunk::delta("partial"));
                tokio::time::sleep(Duration::from_millis(50)).await;
                yield Ok(ModelChunk::final_message(Message::assistant("late reply"), None));
            };
            Ok(Box::pin(stream))
        }

        fn capabilities(&self) -> &LlmCapabilities {
            static CAPS: std::sync::OnceLock<LlmCapabilities> = std::sync::OnceLock::new();
            CAPS.get_or_init(|| LlmCapabilities { supports_tools: ToolSupport::Basic, supports_streaming: true, ..Default::default() })
        }

        fn model_id(&self) -> &str {
            "slow"
        }
    }

    fn test_runner(model: Arc<dyn Model>) -> Runner {
        let agent = Arc::new(Agent::new(model, ToolRegistry::new(), sa_agent::AgentConfig { max_tool_iterations: 8, parallel_tools: false }));
        let sessions: Arc<dyn sa_sessions::Service> = Arc::new(InMemorySessionService::new());
        let memory: Arc<dyn sa_memory::Service> = Arc::new(InMemoryMemoryService::new());
        let summarizer: Arc<dyn Summarizer> = Arc::new(ThresholdSummarizer::new(Default::default()));
        let memory_trigger: Arc<dyn ExtractionTrigger> = Arc::new(ThresholdExtractionTrigger::new(Default::default()));
        Runner::new("app", agent, sessions, memory, summarizer, memory_trigger, None)
    }

    #[tokio::test]
    async fn single_turn_produces_exactly_one_terminal_event() {
        let runner = test_runner(Arc::new(EchoModel));
        let mut stream = runner
            .invoke(InvokeRequest { user_id: "u".into(), session_id: "s".into(), text: "hi".into(), request_id: Some("r1".into()) })
            .await
            .unwrap();

        let events: Vec<Event> = stream.by_ref().map(|e| e.unwrap()).collect().await;
        let terminal: Vec<&Event> = events.iter().filter(|e| e.is_terminal()).collect();
        assert_eq!(terminal.len(), 1);
        assert_eq!(events.last().unwrap().assistant_text(), Some("Echo: hi"));

        let status = runner.status("r1").unwrap();
        assert_eq!(status.status, RunStatus::Succeeded);
    }

    #[tokio::test]
    async fn session_persists_user_and_assistant_events() {
        let runner = test_runner(Arc::new(EchoModel));
        let key = SessionKey::new("app", "u", "s");
        let sessions = runner.sessions.clone();
        let mut stream = runner
            .invoke(InvokeRequest { user_id: "u".into(), session_id: "s".into(), text: "hi".into(), request_id: None })
            .await
            .unwrap();
        let _: Vec<Event> = stream.by_ref().map(|e| e.unwrap()).collect().await;

        let session = sessions.get_session(&key).await.unwrap().unwrap();
        assert!(session.events.iter().any(|e| e.author == "user"));
        assert!(session.events.iter().any(|e| e.author == "agent"));
    }

    #[tokio::test]
    async fn cancel_mid_stream_yields_canceled_terminal_event() {
        let runner = test_runner(Arc::new(SlowModel));
        let mut stream = runner
            .invoke(InvokeRequest { user_id: "u".into(), session_id: "s".into(), text: "hi".into(), request_id: Some("r-cancel".into()) })
            .await
            .unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.object, EventObject::ChatCompletionChunk);
        assert!(runner.cancel("r-cancel"));

        let rest: Vec<Event> = stream.by_ref().map(|e| e.unwrap()).collect().await;
        let last = rest.last().unwrap();
        assert!(last.is_terminal());
        assert_eq!(last.error.as_ref().unwrap().code, "canceled");

        assert_eq!(runner.status("r-cancel").unwrap().status, RunStatus::Canceled);
    }

    #[tokio::test]
    async fn unknown_request_id_cancel_returns_false() {
        let runner = test_runner(Arc::new(EchoModel));
        assert!(!runner.cancel("ghost"));
    }
}

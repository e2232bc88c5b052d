//! The `Model` capability contract (C2).
//!
//! Grounded on the teacher's `LlmProvider` trait
//! (`crates/providers/src/traits.rs`): a provider-agnostic request type, a
//! capabilities getter, and an identifier. Narrowed to Section 4.2's single
//! `Generate` operation — the teacher's separate `chat`/`chat_stream`
//! methods collapse into one streaming call, since every caller in this
//! workspace consumes a chunk stream and folds it to a final message when
//! it needs one.

use async_trait::async_trait;
use sa_domain::capability::LlmCapabilities;
use sa_domain::error::Result;
use sa_domain::message::{Message, ToolDeclaration};
use sa_domain::stream::{BoxStream, ModelChunk};

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDeclaration>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub json_mode: bool,
    pub model: Option<String>,
}

/// Trait every model adapter implements.
///
/// `generate` returns a lazy stream of [`ModelChunk`]s: zero or more
/// `chat_completion_chunk` deltas followed by exactly one terminal
/// `chat_completion` chunk carrying the full message (Section 4.2).
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<BoxStream<'static, Result<ModelChunk>>>;

    fn capabilities(&self) -> &LlmCapabilities;

    fn model_id(&self) -> &str;
}

//! `EchoModel` — the reference `Model` implementation scenario S1 exercises.
//!
//! Grounded on the teacher's OpenAI-compatible adapter's use of
//! `async_stream::stream!` to build a `BoxStream` of chunks
//! (`crates/providers/src/openai_compat.rs`): this model streams its
//! reply word-by-word as `chat_completion_chunk`s, then closes with one
//! `chat_completion` carrying the full message, matching the framing
//! every adapter in this workspace must produce.

use async_trait::async_trait;
use sa_domain::capability::{LlmCapabilities, ToolSupport};
use sa_domain::error::Result;
use sa_domain::message::Message;
use sa_domain::stream::{BoxStream, ModelChunk, Usage};

use crate::traits::{GenerateRequest, Model};

pub struct EchoModel {
    capabilities: LlmCapabilities,
}

impl EchoModel {
    pub fn new() -> Self {
        Self {
            capabilities: LlmCapabilities {
                supports_tools: ToolSupport::Basic,
                supports_streaming: true,
                supports_json_mode: false,
                context_window_tokens: None,
                max_output_tokens: None,
            },
        }
    }
}

impl Default for EchoModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Model for EchoModel {
    async fn generate(&self, request: GenerateRequest) -> Result<BoxStream<'static, Result<ModelChunk>>> {
        let text = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == sa_domain::message::Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let stream = async_stream::stream! {
            let words: Vec<&str> = text.split_whitespace().collect();
            let mut assembled = String::new();
            for (i, word) in words.iter().enumerate() {
                if i > 0 {
                    assembled.push(' ');
                }
                assembled.push_str(word);
                yield Ok(ModelChunk::delta(if i == 0 { word.to_string() } else { format!(" {word}") }));
            }

            let usage = Usage {
                prompt_tokens: words.len() as u32,
                completion_tokens: words.len() as u32,
                total_tokens: (words.len() * 2) as u32,
            };
            yield Ok(ModelChunk::final_message(Message::assistant(assembled), Some(usage)));
        };

        Ok(Box::pin(stream))
    }

    fn capabilities(&self) -> &LlmCapabilities {
        &self.capabilities
    }

    fn model_id(&self) -> &str {
        "echo"
    }
}

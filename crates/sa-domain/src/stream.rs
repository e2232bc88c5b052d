//! The chunk vocabulary a `Model` collaborator (C2) speaks.
//!
//! A chunk is deliberately the same shape as an `Event`'s payload: Section
//! 4.2 of the specification says a streaming model emits N
//! `chat_completion_chunk` chunks followed by one `chat_completion` final,
//! and a non-streaming model emits exactly one `chat_completion` chunk. The
//! Agent aggregates `Delta.content` across chunks into a rolling message,
//! so chunk and `Event::Response` share a representation rather than
//! requiring a translation step.

use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::event::{Choice, EventObject};

pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One element of the lazy sequence `Model::generate` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelChunk {
    /// Always `ChatCompletion` or `ChatCompletionChunk`.
    pub object: EventObject,
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ModelChunk {
    pub fn delta(content: impl Into<String>) -> Self {
        Self {
            object: EventObject::ChatCompletionChunk,
            choices: vec![Choice::delta(content)],
            usage: None,
        }
    }

    pub fn final_message(message: crate::message::Message, usage: Option<Usage>) -> Self {
        Self {
            object: EventObject::ChatCompletion,
            choices: vec![Choice::message(message)],
            usage,
        }
    }
}

//! Inbound message normalization, policy gates, and reply accumulation
//! (Section 4.9).
//!
//! Grounded on the teacher's `session_key` derivation and `run_turn`
//! entry point (`gateway/runtime/mod.rs`, `gateway/runtime/turn.rs`):
//! stripped down to exactly what Section 4.9/6 name — no context-pack
//! building, no skills, no sub-agent delegation.

pub mod session_lock;

use sa_domain::config::PolicyConfig;
use sa_domain::event::{Event, EventObject};

/// One inbound channel message, already stripped of transport framing.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    pub channel: String,
    pub from: Option<String>,
    pub thread: Option<String>,
    pub text: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
}

/// The stable user + session identity an inbound message resolves to.
pub struct Resolved {
    pub user_id: String,
    pub session_id: String,
}

/// Derives `user_id` (falling back to `from`) and `session_id` (Section 6:
/// `"<channel>:dm:<from>"` / `"<channel>:thread:<thread>"`) when the caller
/// didn't supply them directly.
pub fn resolve(msg: &InboundMessage) -> Option<Resolved> {
    let user_id = msg.user_id.clone().or_else(|| msg.from.clone())?;

    let session_id = msg.session_id.clone().unwrap_or_else(|| match &msg.thread {
        Some(thread) => format!("{}:thread:{}", msg.channel, thread),
        None => {
            let from = msg.from.as_deref().unwrap_or(&user_id);
            format!("{}:dm:{}", msg.channel, from)
        }
    });

    Some(Resolved { user_id, session_id })
}

/// The two independent ways a policy gate can stop a message short of the
/// agent, with different wire treatments (Section 6/4.9): an allowlist
/// miss is unauthorized (403); a missing thread mention is merely ignored
/// (200, `ignored: true`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allowed,
    Unauthorized,
    Ignored,
}

/// Applies the user allowlist and, in thread contexts, the
/// `require_mention` gate, in that order: an unlisted user is rejected
/// outright, while a listed user posting in a thread without the required
/// mention is merely ignored.
pub fn policy_allows(policy: &PolicyConfig, msg: &InboundMessage, user_id: &str) -> PolicyDecision {
    if !policy.allows_user(user_id) {
        return PolicyDecision::Unauthorized;
    }
    let is_thread = msg.thread.is_some();
    if !policy.mention_satisfied(is_thread, &msg.text) {
        return PolicyDecision::Ignored;
    }
    PolicyDecision::Allowed
}

/// Folds an invocation's event sequence into the single reply string a
/// non-streaming channel needs (Section 4.9): full `chat_completion`
/// events overwrite; `chat_completion_chunk` deltas append only until the
/// next full completion for that round arrives. Tool events are skipped
/// for the purposes of the reply string, though they still persist via
/// the Runner.
pub fn accumulate_reply(events: &[Event]) -> String {
    let mut reply = String::new();
    let mut round_completed = false;

    for event in events {
        match event.object {
            EventObject::ChatCompletion => {
                if let Some(text) = event.assistant_text() {
                    reply = text.to_string();
                }
                round_completed = true;
            }
            EventObject::ChatCompletionChunk => {
                if !round_completed {
                    if let Some(delta) = event.response.as_ref().and_then(|r| r.choices.first()).and_then(|c| c.delta.as_ref()) {
                        reply.push_str(&delta.content);
                    }
                }
            }
            EventObject::ToolResponse => {
                round_completed = false;
            }
            EventObject::Status => {}
        }
    }

    reply
}

//! Per-request cancellation tokens (Section 4.8: `Runner.Cancel(RequestID)`).
//!
//! Grounded on the teacher's `CancelToken`/`CancelMap`
//! (`crates/gateway/src/runtime/cancel.rs`): an `AtomicBool` flag shared via
//! `Arc`, registered per key in a `Mutex<HashMap>`. Dropped the teacher's
//! cancellation-group fan-out (parent/child turns) — this workspace has no
//! sub-agent delegation, so every invocation cancels independently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks one active [`CancelToken`] per `RequestID`.
#[derive(Default)]
pub struct CancelMap {
    tokens: Mutex<HashMap<String, CancelToken>>,
}

impl CancelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, request_id: &str) -> CancelToken {
        let token = CancelToken::new();
        self.tokens.lock().insert(request_id.to_owned(), token.clone());
        token
    }

    /// Returns `true` if a token was found and cancelled.
    pub fn cancel(&self, request_id: &str) -> bool {
        match self.tokens.lock().get(request_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, request_id: &str) {
        self.tokens.lock().remove(request_id);
    }

    pub fn is_running(&self, request_id: &str) -> bool {
        self.tokens.lock().contains_key(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_lifecycle() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_map_register_and_cancel() {
        let map = CancelMap::new();
        let token = map.register("r1");
        assert!(map.is_running("r1"));
        assert!(map.cancel("r1"));
        assert!(token.is_cancelled());
        map.remove("r1");
        assert!(!map.is_running("r1"));
    }

    #[test]
    fn cancel_nonexistent_request_returns_false() {
        let map = CancelMap::new();
        assert!(!map.cancel("ghost"));
    }

    #[test]
    fn register_replaces_previous_token() {
        let map = CancelMap::new();
        let old = map.register("r1");
        let new = map.register("r1");
        map.cancel("r1");
        assert!(!old.is_cancelled());
        assert!(new.is_cancelled());
    }
}

//! `Session::Service` — the pluggable-backend capability contract (C5).
//!
//! Grounded on the teacher's `SerialMemoryProvider` trait shape
//! (`crates/serialmemory-client/src/provider.rs`): an `async_trait` object
//! is the contract, and every backend (in-memory here; Redis/SQL would be
//! out-of-scope additions) implements the same method set. No inheritance
//! between backends is needed — shared behavior, if any, lives in free
//! functions backends can call.

use async_trait::async_trait;
use sa_domain::event::Event;
use sa_domain::error::Result;

use crate::key::SessionKey;
use crate::model::{Session, SessionSummary};

#[async_trait]
pub trait Service: Send + Sync {
    async fn create_session(
        &self,
        key: SessionKey,
        initial_state: std::collections::HashMap<String, serde_json::Value>,
    ) -> Result<Session>;

    /// Returns a snapshot; `Ok(None)` only when the session truly does not
    /// exist (never an error for a cold cache — backends must load first).
    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>>;

    /// Serializable with other appends for the same key; cross-key appends
    /// may run concurrently (Section 5).
    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<()>;

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<SessionSummary>>;

    /// Atomic with summary removal.
    async fn delete_session(&self, key: &SessionKey) -> Result<()>;

    /// Replaces (never appends to) the stored summary.
    async fn update_session_summary(&self, key: &SessionKey, summary: String) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

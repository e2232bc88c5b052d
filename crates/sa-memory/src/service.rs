//! `Memory::Service` — the pluggable-backend capability contract (C6).
//!
//! Grounded on the teacher's `SerialMemoryProvider` trait
//! (`crates/serialmemory-client/src/provider.rs`): one `async_trait`
//! object, method names that read as verbs on the noun `Memory`, and a
//! `close()` for backend teardown. No persona/graph/RAG-answer surface,
//! since this workspace has no remote SerialMemoryServer to delegate those
//! to, but every operation Section 4.6 names on the Memory capability
//! itself — including `SearchMemory`'s full option set and `Tools()` — is
//! implemented here.

use std::sync::Arc;

use async_trait::async_trait;
use sa_domain::error::Result;
use sa_tools::Tool;

use crate::types::{MemoryEntry, MemoryStats, SearchOptions, SearchResponse};

#[async_trait]
pub trait Service: Send + Sync {
    /// Folds a finished session's content into long-term memory. Backends
    /// decide how to chunk; the reference backend stores one entry per call.
    /// Idempotent when called repeatedly with the same `(app_name, user_id,
    /// content)`.
    async fn add_session_to_memory(&self, app_name: &str, user_id: &str, session_id: &str, content: &str) -> Result<MemoryEntry>;

    async fn search_memory(&self, app_name: &str, user_id: &str, query: &str, options: SearchOptions) -> Result<SearchResponse>;

    /// Replaces an existing entry's content in place, keeping its ID,
    /// author, and session origin.
    async fn update_memory(&self, app_name: &str, memory_id: &str, content: &str) -> Result<MemoryEntry>;

    async fn delete_memory(&self, app_name: &str, memory_id: &str) -> Result<()>;

    async fn delete_user_memories(&self, app_name: &str, user_id: &str) -> Result<usize>;

    async fn get_memory_stats(&self, app_name: &str) -> Result<MemoryStats>;

    /// Exposes `memory_add`, `memory_search`, `memory_load`, and
    /// `memory_update` to the Agent loop. Takes `Arc<Self>` rather than
    /// `&self` because each tool needs its own handle back into this
    /// service that outlives the call building the registry.
    fn tools(self: Arc<Self>) -> Vec<Arc<dyn Tool>>;

    async fn close(&self) -> Result<()>;
}

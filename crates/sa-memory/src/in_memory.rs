//! Reference in-memory `Memory::Service` backend.
//!
//! Grounded on the same `RwLock<HashMap<...>>` index pattern as
//! `sa_sessions::InMemorySessionService`, scored at search time with
//! [`crate::search`].

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use sa_domain::error::{Error, Result};

use crate::search::{score, tokenize};
use crate::service::Service;
use crate::types::{MemoryEntry, MemoryStats, SearchResponse, SortBy, SortOrder};

#[derive(Default)]
pub struct InMemoryMemoryService {
    entries: RwLock<Vec<MemoryEntry>>,
}

impl InMemoryMemoryService {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Derives a stable ID from what a session extraction actually contains, so
/// extracting the same session twice lands on the same entry rather than
/// appending a duplicate (Invariant 4).
fn content_derived_id(app_name: &str, user_id: &str, content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    app_name.hash(&mut hasher);
    user_id.hash(&mut hasher);
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Invariant 8: identical inputs must sort to the same order. Whichever
/// field the caller asked to sort by breaks ties with the other field, then
/// the ID, so two entries are never ordered by insertion order alone.
fn compare_entries(a: &MemoryEntry, b: &MemoryEntry, sort_by: SortBy, sort_order: SortOrder) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let primary = match sort_by {
        SortBy::Score => a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal),
        SortBy::Timestamp => a.created_at.cmp(&b.created_at),
    };
    let primary = match sort_order {
        SortOrder::Desc => primary.reverse(),
        SortOrder::Asc => primary,
    };

    primary.then_with(|| b.created_at.cmp(&a.created_at)).then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl Service for InMemoryMemoryService {
    async fn add_session_to_memory(&self, app_name: &str, user_id: &str, session_id: &str, content: &str) -> Result<MemoryEntry> {
        let id = content_derived_id(app_name, user_id, content);
        let mut guard = self.entries.write();
        if let Some(existing) = guard.iter().find(|e| e.id == id) {
            return Ok(existing.clone());
        }
        let entry = MemoryEntry {
            id,
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            author: "session_summary".to_string(),
            session_id: if session_id.is_empty() { None } else { Some(session_id.to_string()) },
            created_at: Utc::now(),
            score: None,
            metadata: HashMap::new(),
        };
        guard.push(entry.clone());
        Ok(entry)
    }

    async fn search_memory(&self, app_name: &str, user_id: &str, query: &str, options: crate::types::SearchOptions) -> Result<SearchResponse> {
        let started = std::time::Instant::now();
        let query_tokens = tokenize(query);
        let is_blank_query = query.trim().is_empty();

        let mut candidates: Vec<MemoryEntry> = {
            let guard = self.entries.read();
            guard
                .iter()
                .filter(|e| e.app_name == app_name && e.user_id == user_id)
                .filter(|e| options.matches(e))
                .map(|e| {
                    let mut entry = e.clone();
                    entry.score = Some(score(&query_tokens, &e.content));
                    entry
                })
                .filter(|e| is_blank_query || e.score.unwrap_or(0.0) > 0.0)
                .collect()
        };

        let sort_by = options.sort_by.unwrap_or(SortBy::Score);
        let sort_order = options.sort_order.unwrap_or(SortOrder::Desc);
        candidates.sort_by(|a, b| compare_entries(a, b, sort_by, sort_order));

        let total_count = candidates.len();
        let entries = candidates.into_iter().skip(options.offset).take(options.effective_limit()).collect();

        Ok(SearchResponse { entries, total_count, elapsed_time: started.elapsed() })
    }

    async fn update_memory(&self, app_name: &str, memory_id: &str, content: &str) -> Result<MemoryEntry> {
        let mut guard = self.entries.write();
        let entry = guard
            .iter_mut()
            .find(|e| e.app_name == app_name && e.id == memory_id)
            .ok_or_else(|| Error::Storage(format!("memory entry {memory_id} not found")))?;
        entry.content = content.to_string();
        Ok(entry.clone())
    }

    async fn delete_memory(&self, app_name: &str, memory_id: &str) -> Result<()> {
        self.entries.write().retain(|e| !(e.app_name == app_name && e.id == memory_id));
        Ok(())
    }

    async fn delete_user_memories(&self, app_name: &str, user_id: &str) -> Result<usize> {
        let mut guard = self.entries.write();
        let before = guard.len();
        guard.retain(|e| !(e.app_name == app_name && e.user_id == user_id));
        Ok(before - guard.len())
    }

    async fn get_memory_stats(&self, app_name: &str) -> Result<MemoryStats> {
        let guard = self.entries.read();
        let scoped: Vec<&MemoryEntry> = guard.iter().filter(|e| e.app_name == app_name).collect();

        let mut sessions: HashMap<&str, ()> = HashMap::new();
        for e in &scoped {
            if let Some(session_id) = &e.session_id {
                sessions.insert(session_id.as_str(), ());
            }
        }

        let total_sessions = sessions.len();
        let total_entries = scoped.len();
        let oldest_timestamp = scoped.iter().map(|e| e.created_at).min();
        let newest_timestamp = scoped.iter().map(|e| e.created_at).max();
        let average_entries_per_session = if total_sessions == 0 { 0.0 } else { total_entries as f64 / total_sessions as f64 };

        Ok(MemoryStats { total_sessions, total_entries, oldest_timestamp, newest_timestamp, average_entries_per_session })
    }

    fn tools(self: Arc<Self>) -> Vec<Arc<dyn sa_tools::Tool>> {
        let service: Arc<dyn Service> = self;
        crate::tools::memory_tools(service)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchOptions;

    async fn add(svc: &InMemoryMemoryService, app: &str, user: &str, content: &str) -> MemoryEntry {
        svc.add_session_to_memory(app, user, "s1", content).await.unwrap()
    }

    #[tokio::test]
    async fn search_ranks_by_overlap_and_respects_limit() {
        let svc = InMemoryMemoryService::new();
        add(&svc, "app", "u1", "the user's favorite color is blue").await;
        add(&svc, "app", "u1", "the user likes blue skies").await;
        add(&svc, "app", "u1", "completely unrelated entry").await;

        let options = SearchOptions { limit: Some(1), ..Default::default() };
        let response = svc.search_memory("app", "u1", "favorite color blue", options).await.unwrap();
        assert_eq!(response.entries.len(), 1);
        assert!(response.entries[0].content.contains("favorite"));
        assert_eq!(response.total_count, 2);
    }

    #[tokio::test]
    async fn search_is_scoped_to_app_and_user() {
        let svc = InMemoryMemoryService::new();
        add(&svc, "app", "u1", "shared secret token").await;
        add(&svc, "app", "u2", "shared secret token").await;
        let response = svc.search_memory("app", "u1", "shared secret token", SearchOptions::default()).await.unwrap();
        assert_eq!(response.entries.len(), 1);
    }

    #[tokio::test]
    async fn equal_scores_are_ordered_deterministically() {
        let svc = InMemoryMemoryService::new();
        // Both entries score identically against the query; only insertion
        // order would distinguish them without the tie-break chain.
        add(&svc, "app", "u1", "alpha bravo").await;
        add(&svc, "app", "u1", "alpha charlie").await;

        let first_run = svc.search_memory("app", "u1", "alpha", SearchOptions::default()).await.unwrap();
        let second_run = svc.search_memory("app", "u1", "alpha", SearchOptions::default()).await.unwrap();

        assert_eq!(first_run.entries[0].score, first_run.entries[1].score);
        let first_ids: Vec<String> = first_run.entries.iter().map(|e| e.id.clone()).collect();
        let second_ids: Vec<String> = second_run.entries.iter().map(|e| e.id.clone()).collect();
        assert_eq!(first_ids, second_ids, "identical stored entries must sort identically every time");
    }

    #[tokio::test]
    async fn blank_query_loads_everything_without_score_filtering() {
        let svc = InMemoryMemoryService::new();
        add(&svc, "app", "u1", "one").await;
        add(&svc, "app", "u1", "two").await;

        let options = SearchOptions { sort_by: Some(SortBy::Timestamp), sort_order: Some(SortOrder::Desc), ..Default::default() };
        let response = svc.search_memory("app", "u1", "", options).await.unwrap();
        assert_eq!(response.entries.len(), 2);
    }

    #[tokio::test]
    async fn search_filters_by_author_and_session() {
        let svc = InMemoryMemoryService::new();
        svc.add_session_to_memory("app", "u1", "s1", "from session one").await.unwrap();
        svc.add_session_to_memory("app", "u1", "s2", "from session two").await.unwrap();

        let options = SearchOptions { include_session_id: Some("s1".into()), ..Default::default() };
        let response = svc.search_memory("app", "u1", "", options).await.unwrap();
        assert_eq!(response.entries.len(), 1);
        assert_eq!(response.entries[0].session_id.as_deref(), Some("s1"));

        let options = SearchOptions { exclude_session_id: Some("s1".into()), ..Default::default() };
        let response = svc.search_memory("app", "u1", "", options).await.unwrap();
        assert_eq!(response.entries.len(), 1);
        assert_eq!(response.entries[0].session_id.as_deref(), Some("s2"));
    }

    #[tokio::test]
    async fn adding_the_same_session_twice_is_idempotent() {
        let svc = InMemoryMemoryService::new();
        let first = add(&svc, "app", "u1", "we discussed the roadmap").await;
        let second = add(&svc, "app", "u1", "we discussed the roadmap").await;
        assert_eq!(first.id, second.id);

        let stats = svc.get_memory_stats("app").await.unwrap();
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn update_memory_replaces_content_keeping_id() {
        let svc = InMemoryMemoryService::new();
        let entry = add(&svc, "app", "u1", "first draft").await;
        let updated = svc.update_memory("app", &entry.id, "final draft").await.unwrap();
        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.content, "final draft");
    }

    #[tokio::test]
    async fn update_memory_rejects_unknown_id() {
        let svc = InMemoryMemoryService::new();
        let err = svc.update_memory("app", "no-such-id", "x").await.unwrap_err();
        assert_eq!(err.code(), "storage_error");
    }

    #[tokio::test]
    async fn delete_user_memories_returns_count_and_is_scoped() {
        let svc = InMemoryMemoryService::new();
        add(&svc, "app", "u1", "a").await;
        add(&svc, "app", "u1", "b").await;
        add(&svc, "app", "u2", "c").await;
        let removed = svc.delete_user_memories("app", "u1").await.unwrap();
        assert_eq!(removed, 2);
        let stats = svc.get_memory_stats("app").await.unwrap();
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn get_memory_stats_reports_session_shape() {
        let svc = InMemoryMemoryService::new();
        svc.add_session_to_memory("app", "u1", "s1", "a").await.unwrap();
        svc.add_session_to_memory("app", "u1", "s1", "b distinct").await.unwrap();
        svc.add_session_to_memory("app", "u2", "s2", "c").await.unwrap();

        let stats = svc.get_memory_stats("app").await.unwrap();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.total_sessions, 2);
        assert!((stats.average_entries_per_session - 1.5).abs() < f64::EPSILON);
        assert!(stats.oldest_timestamp.is_some());
        assert!(stats.newest_timestamp.is_some());
    }
}

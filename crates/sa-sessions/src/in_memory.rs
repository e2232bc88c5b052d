//! Reference in-memory `Session::Service` backend.
//!
//! Grounded on the teacher's `SessionStore` (`crates/sessions/src/store.rs`):
//! a `parking_lot::RwLock<HashMap<...>>` index, a fast-path read followed by
//! a write-lock insert on miss (`resolve_or_create`), and a `TraceEvent`
//! emitted on resolution. This backend keeps the full event log in memory
//! rather than the teacher's usage counters, since Section 3 requires
//! `Session.Events` to be the source of truth.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use sa_domain::error::{Error, Result};
use sa_domain::event::Event;
use sa_domain::trace::TraceEvent;

use crate::key::SessionKey;
use crate::model::{Session, SessionSummary};
use crate::service::Service;

#[derive(Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Service for InMemorySessionService {
    async fn create_session(
        &self,
        key: SessionKey,
        initial_state: HashMap<String, serde_json::Value>,
    ) -> Result<Session> {
        let flat = key.flatten();
        let mut guard = self.sessions.write();
        if let Some(existing) = guard.get(&flat) {
            return Ok(existing.clone());
        }
        let session = Session::new(key.clone(), initial_state);
        guard.insert(flat, session.clone());
        TraceEvent::SessionResolved {
            session_key: key.flatten(),
            session_id: key.session_id.clone(),
            is_new: true,
        }
        .emit();
        Ok(session)
    }

    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>> {
        Ok(self.sessions.read().get(&key.flatten()).cloned())
    }

    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<()> {
        let mut guard = self.sessions.write();
        let session = guard
            .get_mut(&key.flatten())
            .ok_or_else(|| Error::Storage(format!("session not found: {}", key.flatten())))?;
        session.events.push(event);
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<SessionSummary>> {
        Ok(self
            .sessions
            .read()
            .values()
            .filter(|s| s.key.app_name == app_name && s.key.user_id == user_id)
            .map(|s| s.summarize())
            .collect())
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        self.sessions.write().remove(&key.flatten());
        Ok(())
    }

    async fn update_session_summary(&self, key: &SessionKey, summary: String) -> Result<()> {
        let mut guard = self.sessions.write();
        let session = guard
            .get_mut(&key.flatten())
            .ok_or_else(|| Error::Storage(format!("session not found: {}", key.flatten())))?;
        session.summary = Some(summary);
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sa_domain::event::EventObject;

    fn key() -> SessionKey {
        SessionKey::new("app", "u1", "s1")
    }

    #[tokio::test]
    async fn create_session_is_idempotent() {
        let svc = InMemorySessionService::new();
        let a = svc.create_session(key(), HashMap::new()).await.unwrap();
        let b = svc.create_session(key(), HashMap::new()).await.unwrap();
        assert_eq!(a.created_at, b.created_at);
    }

    #[tokio::test]
    async fn append_event_requires_existing_session() {
        let svc = InMemorySessionService::new();
        let event = Event::new("inv", "req", "user", EventObject::Status);
        let err = svc.append_event(&key(), event).await.unwrap_err();
        assert_eq!(err.code(), "storage_error");
    }

    #[tokio::test]
    async fn append_event_preserves_order_and_bumps_updated_at() {
        let svc = InMemorySessionService::new();
        let created = svc.create_session(key(), HashMap::new()).await.unwrap();
        for i in 0..3 {
            let event = Event::new("inv", "req", format!("author{i}"), EventObject::Status);
            svc.append_event(&key(), event).await.unwrap();
        }
        let session = svc.get_session(&key()).await.unwrap().unwrap();
        assert_eq!(session.events.len(), 3);
        assert_eq!(session.events[0].author, "author0");
        assert_eq!(session.events[2].author, "author2");
        assert!(session.updated_at >= created.created_at);
    }

    #[tokio::test]
    async fn delete_session_removes_events_and_summary_atomically() {
        let svc = InMemorySessionService::new();
        svc.create_session(key(), HashMap::new()).await.unwrap();
        svc.update_session_summary(&key(), "summary".into()).await.unwrap();
        svc.delete_session(&key()).await.unwrap();
        assert!(svc.get_session(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_sessions_filters_by_app_and_user() {
        let svc = InMemorySessionService::new();
        svc.create_session(key(), HashMap::new()).await.unwrap();
        svc.create_session(SessionKey::new("app", "u2", "s2"), HashMap::new()).await.unwrap();
        let list = svc.list_sessions("app", "u1").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].key.user_id, "u1");
    }
}

//! Run tracking — the `Runner.GetStatus(RequestID)` query surface (Section 4.8).
//!
//! Grounded on the teacher's `Run`/`RunStore`
//! (`crates/gateway/src/runtime/runs.rs`): a bounded in-memory ring plus an
//! O(1) index, so status queries don't require O(n) scans and memory is
//! capped under sustained load. Dropped the teacher's JSONL persistence and
//! per-run SSE broadcast channels — Section 4.8 names only a point-in-time
//! status query, not a durable run history or live log tail.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

const MAX_RUNS_IN_MEMORY: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    /// The wire-level state string Section 6's `GET /v1/gateway/status`
    /// returns.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub request_id: String,
    pub invocation_id: String,
    pub session_key: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub loop_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Run {
    pub fn new(request_id: impl Into<String>, invocation_id: impl Into<String>, session_key: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            invocation_id: invocation_id.into(),
            session_key: session_key.into(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            loop_count: 0,
            error: None,
        }
    }

    pub fn finish(&mut self, status: RunStatus, error: Option<String>) {
        self.status = status;
        self.ended_at = Some(Utc::now());
        self.duration_ms = Some((Utc::now() - self.started_at).num_milliseconds().max(0) as u64);
        self.error = error;
    }
}

struct RunStoreInner {
    runs: VecDeque<Run>,
    index: HashMap<String, usize>,
    base_seq: usize,
}

impl RunStoreInner {
    fn new() -> Self {
        Self { runs: VecDeque::new(), index: HashMap::new(), base_seq: 0 }
    }

    fn deque_idx(&self, seq: usize) -> usize {
        seq - self.base_seq
    }

    fn get_mut(&mut self, request_id: &str) -> Option<&mut Run> {
        let seq = *self.index.get(request_id)?;
        let idx = self.deque_idx(seq);
        self.runs.get_mut(idx)
    }

    fn get(&self, request_id: &str) -> Option<&Run> {
        let seq = *self.index.get(request_id)?;
        let idx = self.deque_idx(seq);
        self.runs.get(idx)
    }

    fn push(&mut self, run: Run) {
        let seq = self.base_seq + self.runs.len();
        self.index.insert(run.request_id.clone(), seq);
        self.runs.push_back(run);

        while self.runs.len() > MAX_RUNS_IN_MEMORY {
            if let Some(evicted) = self.runs.pop_front() {
                self.index.remove(&evicted.request_id);
                self.base_seq += 1;
            }
        }
    }
}

/// Bounded, query-only record of recent runs.
pub struct RunStore {
    inner: RwLock<RunStoreInner>,
}

impl Default for RunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore {
    pub fn new() -> Self {
        Self { inner: RwLock::new(RunStoreInner::new()) }
    }

    pub fn start(&self, run: Run) {
        self.inner.write().push(run);
    }

    pub fn increment_loop_count(&self, request_id: &str) {
        if let Some(run) = self.inner.write().get_mut(request_id) {
            run.loop_count += 1;
        }
    }

    pub fn finish(&self, request_id: &str, status: RunStatus, error: Option<String>) {
        if let Some(run) = self.inner.write().get_mut(request_id) {
            run.finish(status, error);
        }
    }

    pub fn get(&self, request_id: &str) -> Option<Run> {
        self.inner.read().get(request_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_then_finish_updates_status_and_timing() {
        let store = RunStore::new();
        store.start(Run::new("r1", "i1", "app::u::s"));
        assert_eq!(store.get("r1").unwrap().status, RunStatus::Running);

        store.finish("r1", RunStatus::Succeeded, None);
        let run = store.get("r1").unwrap();
        assert_eq!(run.status, RunStatus::Succeeded);
        assert!(run.ended_at.is_some());
        assert!(run.status.is_terminal());
    }

    #[test]
    fn unknown_request_id_returns_none() {
        let store = RunStore::new();
        assert!(store.get("ghost").is_none());
    }

    #[test]
    fn ring_evicts_oldest_run_past_capacity() {
        let store = RunStore::new();
        for i in 0..(super::MAX_RUNS_IN_MEMORY + 5) {
            store.start(Run::new(format!("r{i}"), "i", "s"));
        }
        assert!(store.get("r0").is_none());
        assert!(store.get(&format!("r{}", super::MAX_RUNS_IN_MEMORY + 4)).is_some());
    }
}

//! The lane lock (Section 4.9): serializes concurrent requests for the same
//! session while letting unrelated sessions run in parallel.
//!
//! Grounded on the teacher's `SessionLockMap`
//! (`gateway/runtime/session_lock.rs`): a mutex-protected map of per-session
//! `Semaphore(1)`s. Acquiring an uncontended lane never blocks; a second
//! caller for the same session waits for the first to finish rather than
//! being rejected, since the specification's lane lock is about ordering,
//! not backpressure.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use sa_domain::trace::TraceEvent;

/// One `Semaphore(1)` per session ID; holding its permit is holding the lane.
pub struct LaneLock {
    lanes: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Default for LaneLock {
    fn default() -> Self {
        Self::new()
    }
}

impl LaneLock {
    pub fn new() -> Self {
        Self { lanes: Mutex::new(HashMap::new()) }
    }

    /// Waits for exclusive access to `session_id`. Releases automatically
    /// when the returned permit drops.
    pub async fn acquire(&self, session_id: &str) -> OwnedSemaphorePermit {
        let sem = {
            let mut lanes = self.lanes.lock();
            lanes.entry(session_id.to_owned()).or_insert_with(|| Arc::new(Semaphore::new(1))).clone()
        };

        let waiters = if sem.available_permits() == 0 { 1 } else { 0 };
        TraceEvent::LaneAcquired { session_id: session_id.to_string(), waiters }.emit();

        let permit = sem.acquire_owned().await.expect("lane semaphore is never closed");
        permit
    }

    pub fn release_trace(&self, session_id: &str) {
        TraceEvent::LaneReleased { session_id: session_id.to_string() }.emit();
    }

    /// Number of tracked sessions (for monitoring / tests).
    pub fn lane_count(&self) -> usize {
        self.lanes.lock().len()
    }

    /// Drops bookkeeping for lanes with no current holder. Call periodically
    /// so the map doesn't grow unbounded across a long-lived process.
    pub fn prune_idle(&self) {
        let mut lanes = self.lanes.lock();
        lanes.retain(|_, sem| sem.available_permits() == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sequential_access_on_same_lane() {
        let lock = LaneLock::new();
        let permit1 = lock.acquire("s1").await;
        drop(permit1);
        let permit2 = lock.acquire("s1").await;
        drop(permit2);
    }

    #[tokio::test]
    async fn distinct_sessions_run_concurrently() {
        let lock = Arc::new(LaneLock::new());
        let p1 = lock.acquire("s1").await;
        let p2 = lock.acquire("s2").await;
        assert_eq!(lock.lane_count(), 2);
        drop(p1);
        drop(p2);
    }

    #[tokio::test]
    async fn same_session_second_caller_waits() {
        let lock = Arc::new(LaneLock::new());
        let lock2 = lock.clone();
        let p1 = lock.acquire("s1").await;

        let handle = tokio::spawn(async move {
            let _p2 = lock2.acquire("s1").await;
            42
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(p1);

        assert_eq!(handle.await.unwrap(), 42);
    }
}

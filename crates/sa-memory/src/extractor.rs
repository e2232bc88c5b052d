//! Bounded worker-pool memory extractor.
//!
//! Grounded on the teacher's node-registry pattern of a bounded
//! `tokio::mpsc` channel drained by a fixed pool of worker tasks
//! (`crates/node-sdk` connection-handling loop): `enqueue` never blocks
//! the caller — a full queue drops the job and emits a trace event rather
//! than applying backpressure to the request path, since extraction is a
//! best-effort background concern, not something a user-facing reply
//! should wait on.

use std::sync::Arc;
use std::time::Duration;

use sa_domain::trace::TraceEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::service::Service;

struct ExtractionJob {
    session_id: String,
    app_name: String,
    user_id: String,
    content: String,
}

pub struct MemoryExtractor {
    sender: mpsc::Sender<ExtractionJob>,
    workers: Vec<JoinHandle<()>>,
}

impl MemoryExtractor {
    pub fn spawn(memory: Arc<dyn Service>, worker_count: usize, queue_size: usize, job_timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(queue_size.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..worker_count)
            .map(|_| {
                let memory = memory.clone();
                let receiver = receiver.clone();
                tokio::spawn(async move {
                    loop {
                        let job = {
                            let mut guard = receiver.lock().await;
                            guard.recv().await
                        };
                        let Some(job) = job else { break };
                        run_job(&memory, job, job_timeout).await;
                    }
                })
            })
            .collect();

        Self { sender, workers }
    }

    /// Enqueues a job; drops it (and traces the drop) if the queue is full
    /// rather than blocking the caller.
    pub fn enqueue(&self, session_id: impl Into<String>, app_name: impl Into<String>, user_id: impl Into<String>, content: impl Into<String>) {
        let session_id = session_id.into();
        let job = ExtractionJob {
            session_id: session_id.clone(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            content: content.into(),
        };
        match self.sender.try_send(job) {
            Ok(()) => {
                TraceEvent::MemoryExtractionEnqueued { session_id }.emit();
            }
            Err(_) => {
                TraceEvent::MemoryExtractionDropped { session_id, reason: "queue_full".into() }.emit();
            }
        }
    }

    /// Stops accepting new jobs and waits for in-flight work to drain.
    pub async fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn run_job(memory: &Arc<dyn Service>, job: ExtractionJob, job_timeout: Duration) {
    let result = tokio::time::timeout(
        job_timeout,
        memory.add_session_to_memory(&job.app_name, &job.user_id, &job.session_id, &job.content),
    )
    .await;

    match result {
        Ok(Ok(_entry)) => {}
        Ok(Err(e)) => {
            TraceEvent::MemoryExtractionFailed { session_id: job.session_id, error: e.to_string() }.emit();
        }
        Err(_elapsed) => {
            TraceEvent::MemoryExtractionFailed { session_id: job.session_id, error: "timed_out".into() }.emit();
        }
    }
}

//! Log writer worker and retention enforcement.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use taskpulse_core::{HttpMethod, StoreError, TaskLog, TaskLogStore};
use taskpulse_queue::{Job, JobHandler, QueueError};

/// Default retention cap per task.
pub const DEFAULT_MAX_LOGS_PER_TASK: usize = 10;

/// Payload of a log-write job: one execution outcome waiting to be
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogWrite {
    /// Task the outcome belongs to.
    pub task_id: Uuid,
    /// Endpoint that was probed.
    pub endpoint: String,
    /// Method used.
    pub method: HttpMethod,
    /// HTTP status, or the failure sentinel.
    pub status_code: u16,
    /// Request duration in milliseconds.
    pub duration_ms: u64,
    /// Response body size in bytes.
    pub response_size_bytes: u64,
    /// When the dispatching schedule was due.
    pub scheduled_at: DateTime<Utc>,
    /// When execution started.
    pub executed_at: DateTime<Utc>,
}

/// Persists log-write jobs while holding each task's history at the cap.
///
/// Writes for the same task are serialized through a per-task mutex, so two
/// workers handling that task concurrently cannot both observe a below-cap
/// count and overshoot the retention window.
pub struct LogWriter {
    store: Arc<dyn TaskLogStore>,
    max_logs_per_task: usize,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl LogWriter {
    /// Create a log writer over a store.
    pub fn new(store: Arc<dyn TaskLogStore>, max_logs_per_task: usize) -> Self {
        Self {
            store,
            max_logs_per_task: max_logs_per_task.max(1),
            locks: DashMap::new(),
        }
    }

    fn task_lock(&self, task_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(task_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn persist(&self, write: &LogWrite) -> Result<(), StoreError> {
        let lock = self.task_lock(write.task_id);
        let _guard = lock.lock().await;

        let oldest = self
            .store
            .find_oldest(&write.task_id, self.max_logs_per_task)
            .await?;
        if oldest.len() >= self.max_logs_per_task {
            if let Some(evict) = oldest.first() {
                self.store.delete(&evict.id).await?;
                debug!("evicted log {} for task {}", evict.id, write.task_id);
            }
        }

        let log = TaskLog::new(
            write.task_id,
            write.endpoint.clone(),
            write.method,
            write.status_code,
            write.duration_ms,
            write.response_size_bytes,
            write.scheduled_at,
            write.executed_at,
        );
        self.store.insert(&log).await
    }
}

#[async_trait]
impl JobHandler<LogWrite> for LogWriter {
    async fn handle(&self, job: &Job<LogWrite>) -> Result<(), QueueError> {
        self.persist(&job.payload)
            .await
            .map_err(|e| QueueError::Storage(e.to_string()))
    }
}

#[cfg(test)]
#[path = "log_writer_tests.rs"]
mod tests;

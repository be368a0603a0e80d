//! Execution worker: performs the probe and always emits a log payload.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use taskpulse_core::{Task, FAILURE_STATUS_CODE};
use taskpulse_queue::{Job, JobHandler, QueueError};

use crate::client::ProbeClient;
use crate::log_writer::LogWrite;

/// Executes dispatched probe jobs.
///
/// Every outcome, whether a response of any status or a transport failure,
/// becomes exactly one log-write job. A failing probe therefore never
/// surfaces an error to the dispatch layer, and future fires of the
/// schedule are unaffected.
pub struct ProbeExecutor {
    client: ProbeClient,
    log_tx: mpsc::Sender<Job<LogWrite>>,
}

impl ProbeExecutor {
    /// Create an executor that forwards outcomes to the log-write channel.
    pub fn new(client: ProbeClient, log_tx: mpsc::Sender<Job<LogWrite>>) -> Self {
        Self { client, log_tx }
    }
}

#[async_trait]
impl JobHandler<Task> for ProbeExecutor {
    async fn handle(&self, job: &Job<Task>) -> Result<(), QueueError> {
        let task = &job.payload;
        let executed_at = Utc::now();
        let scheduled_at = job.due_at.unwrap_or(executed_at);

        let mut write = LogWrite {
            task_id: task.id,
            endpoint: task.endpoint.clone(),
            method: task.method,
            status_code: FAILURE_STATUS_CODE,
            duration_ms: 0,
            response_size_bytes: 0,
            scheduled_at,
            executed_at,
        };

        match self.client.probe(task).await {
            Ok(response) => {
                debug!(
                    "fetch {} - {} - {} ms - {} bytes",
                    task.name, response.status, response.duration_ms,
                    response.response_size_bytes
                );
                write.status_code = response.status;
                write.duration_ms = response.duration_ms;
                write.response_size_bytes = response.response_size_bytes;
            }
            Err(e) => {
                // Sentinel values stay in place; the failure is only an
                // outcome to record.
                warn!("fetch {} failed: {}", task.name, e);
            }
        }

        self.log_tx
            .send(Job::new(write))
            .await
            .map_err(|_| QueueError::ChannelClosed)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

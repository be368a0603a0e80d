//! Scheduler and task-mutation errors.

use thiserror::Error;
use uuid::Uuid;

use taskpulse_core::StoreError;
use taskpulse_cron::CronError;
use taskpulse_queue::QueueError;

/// Scheduler error types.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Another task of the same owner already uses the name.
    #[error("task name '{0}' already exists")]
    NameTaken(String),

    /// Endpoint is not a usable http(s) URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Cron expression rejected.
    #[error(transparent)]
    Cron(#[from] CronError),

    /// Task does not exist, or belongs to someone else.
    #[error("task not found: {0}")]
    TaskNotFound(Uuid),

    /// Task store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Queue registration failed; the mutation may be retried.
    #[error("schedule registration failed: {0}")]
    Queue(#[source] QueueError),
}

impl SchedulerError {
    /// Whether the caller should retry rather than fix its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedulerError::Store(_) | SchedulerError::Queue(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_not_retryable() {
        assert!(!SchedulerError::NameTaken("ping".to_string()).is_retryable());
        assert!(!SchedulerError::Cron(CronError::InvalidCron("x".to_string())).is_retryable());
    }

    #[test]
    fn test_queue_errors_are_retryable() {
        let err = SchedulerError::Queue(QueueError::ChannelClosed);
        assert!(err.is_retryable());
    }
}

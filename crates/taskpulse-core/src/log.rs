//! Execution outcome records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::HttpMethod;

/// Status code recorded when no HTTP response was obtained at all.
pub const FAILURE_STATUS_CODE: u16 = 500;

/// The outcome of one probe execution.
///
/// Rows are written once by the log writer and never mutated; they are only
/// removed by retention eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLog {
    /// Unique log ID.
    pub id: Uuid,
    /// Owning task.
    pub task_id: Uuid,
    /// Endpoint that was probed.
    pub endpoint: String,
    /// Method used.
    pub method: HttpMethod,
    /// HTTP status, or [`FAILURE_STATUS_CODE`] when the request never
    /// completed.
    pub status_code: u16,
    /// Wall-clock duration of the request in milliseconds.
    pub duration_ms: u64,
    /// Response body size in bytes.
    pub response_size_bytes: u64,
    /// When the dispatching schedule was due.
    pub scheduled_at: DateTime<Utc>,
    /// When execution actually started.
    pub executed_at: DateTime<Utc>,
    /// Persistence time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl TaskLog {
    /// Create a new log row stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_id: Uuid,
        endpoint: impl Into<String>,
        method: HttpMethod,
        status_code: u16,
        duration_ms: u64,
        response_size_bytes: u64,
        scheduled_at: DateTime<Utc>,
        executed_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_id,
            endpoint: endpoint.into(),
            method,
            status_code,
            duration_ms,
            response_size_bytes,
            scheduled_at,
            executed_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this row records a total failure rather than a real response.
    pub fn is_failure(&self) -> bool {
        self.status_code == FAILURE_STATUS_CODE && self.duration_ms == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_new() {
        let task_id = Uuid::new_v4();
        let now = Utc::now();
        let log = TaskLog::new(
            task_id,
            "https://example.com",
            HttpMethod::Get,
            200,
            42,
            128,
            now,
            now,
        );
        assert_eq!(log.task_id, task_id);
        assert_eq!(log.status_code, 200);
        assert!(!log.is_failure());
    }

    #[test]
    fn test_failure_sentinel() {
        let now = Utc::now();
        let log = TaskLog::new(
            Uuid::new_v4(),
            "https://example.com",
            HttpMethod::Get,
            FAILURE_STATUS_CODE,
            0,
            0,
            now,
            now,
        );
        assert!(log.is_failure());
    }
}

//! Job envelope and schedule identity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work flowing through a queue channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job<P> {
    /// Unique job ID.
    pub id: Uuid,
    /// Job payload.
    pub payload: P,
    /// Delivery attempt, starting at 1.
    pub attempt: u32,
    /// The time this dispatch was due, when cron-driven.
    pub due_at: Option<DateTime<Utc>>,
    /// When the job entered the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl<P> Job<P> {
    /// Create a new job around a payload.
    pub fn new(payload: P) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            attempt: 1,
            due_at: None,
            enqueued_at: Utc::now(),
        }
    }

    /// Set the cron-computed due time.
    pub fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// The same job, one delivery attempt later.
    pub fn next_attempt(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

/// Identity of a repeating schedule: the queue-wide job id plus the exact
/// cron pattern it was registered under.
///
/// Cleanup after edits works on sets of these keys, so removing a stale
/// schedule is an idempotent set operation rather than a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleKey {
    /// Job id shared by all schedules of one source entity.
    pub job_id: String,
    /// Cron pattern the schedule was registered under.
    pub pattern: String,
}

impl ScheduleKey {
    /// Create a schedule key.
    pub fn new(job_id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            pattern: pattern.into(),
        }
    }
}

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.job_id, self.pattern)
    }
}

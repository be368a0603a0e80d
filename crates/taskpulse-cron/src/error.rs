//! Cron validation errors.

use thiserror::Error;

/// Cron validation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    /// Expression (or its timezone) cannot be parsed.
    #[error("invalid cron expression: {0}")]
    InvalidCron(String),

    /// Schedule fires more often than the policy allows.
    #[error("schedule would run every {actual_secs}s, minimum allowed interval is {min_secs}s")]
    TooFrequent {
        /// Observed spacing across the sampled window.
        actual_secs: u64,
        /// Smallest allowed spacing.
        min_secs: u64,
    },
}

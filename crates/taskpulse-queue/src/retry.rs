//! Bounded retry with exponential backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy: a fixed attempt ceiling with exponentially growing delays.
///
/// The attempt count travels on the job envelope and the delay is a pure
/// function of it, so the ceiling can be tested without running a worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total delivery attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds. Doubles with each
    /// further attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    5000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Whether a job whose `attempt`-th delivery just failed may be retried.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before re-delivering a job whose `attempt`-th delivery failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << exponent))
    }
}

//! Queue configuration.

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Queue and worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Concurrent probe executions.
    #[serde(default = "default_workers")]
    pub execution_workers: usize,

    /// Concurrent log writes.
    #[serde(default = "default_workers")]
    pub log_workers: usize,

    /// Capacity of each dispatch channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Retry policy applied to log-write jobs.
    #[serde(default)]
    pub log_retry: RetryPolicy,
}

fn default_workers() -> usize {
    1
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            execution_workers: default_workers(),
            log_workers: default_workers(),
            channel_capacity: default_channel_capacity(),
            log_retry: RetryPolicy::default(),
        }
    }
}

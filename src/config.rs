//! Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use taskpulse_cron::FrequencyPolicy;
use taskpulse_probe::ProbeConfig;
use taskpulse_queue::QueueConfig;

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Worker pool and channel sizing.
    pub queue: QueueConfig,
    /// Outbound probe client settings.
    pub probe: ProbeConfig,
    /// Log retention settings.
    pub retention: RetentionConfig,
    /// Minimum-frequency policy for task schedules.
    pub frequency: FrequencyPolicy,
}

/// Log retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Maximum log rows kept per task.
    #[serde(default = "default_max_logs_per_task")]
    pub max_logs_per_task: usize,
}

fn default_max_logs_per_task() -> usize {
    taskpulse_probe::DEFAULT_MAX_LOGS_PER_TASK
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_logs_per_task: default_max_logs_per_task(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

//! Task mutation gate: validation, persistence, schedule reconciliation.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use taskpulse_core::{AlertConfig, HttpMethod, Task, TaskStore};
use taskpulse_cron::{resolve_timezone, validate_frequency, FrequencyPolicy};

use crate::error::SchedulerError;
use crate::scheduler::Scheduler;

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    /// Task name, unique within the owner's tasks.
    pub name: String,
    /// HTTP method for the probe.
    pub method: HttpMethod,
    /// Target URL.
    pub endpoint: String,
    /// Cron expression.
    pub cron: String,
    /// IANA timezone. Empty means UTC.
    #[serde(default)]
    pub timezone: String,
    /// Request headers as a serialized JSON object.
    #[serde(default)]
    pub headers: Option<String>,
    /// Request body.
    #[serde(default)]
    pub body: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub note: String,
    /// Alert settings.
    #[serde(default)]
    pub alert: Option<AlertConfig>,
    /// Whether to activate the schedule immediately.
    #[serde(default)]
    pub is_enable: bool,
}

/// Partial update of a task. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub method: Option<HttpMethod>,
    pub endpoint: Option<String>,
    pub cron: Option<String>,
    pub timezone: Option<String>,
    pub headers: Option<String>,
    pub body: Option<String>,
    pub note: Option<String>,
    pub alert: Option<AlertConfig>,
    pub is_enable: Option<bool>,
}

/// The gate every task mutation passes through before it can reach the
/// queue: uniqueness and frequency validation, cron-history maintenance,
/// persistence, then schedule reconciliation.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    scheduler: Arc<Scheduler>,
    policy: FrequencyPolicy,
}

impl TaskService {
    /// Create a service over a task store and scheduler.
    pub fn new(store: Arc<dyn TaskStore>, scheduler: Arc<Scheduler>, policy: FrequencyPolicy) -> Self {
        Self {
            store,
            scheduler,
            policy,
        }
    }

    async fn ensure_name_free(
        &self,
        owner_id: &Uuid,
        name: &str,
        current: Option<&Uuid>,
    ) -> Result<(), SchedulerError> {
        if let Some(existing) = self.store.find_by_name(owner_id, name).await? {
            if current != Some(&existing.id) {
                return Err(SchedulerError::NameTaken(name.to_string()));
            }
        }
        Ok(())
    }

    fn validate_endpoint(endpoint: &str) -> Result<(), SchedulerError> {
        let url = url::Url::parse(endpoint)
            .map_err(|e| SchedulerError::InvalidEndpoint(format!("'{}': {}", endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SchedulerError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }

    /// Create a task. Tasks come up disabled unless the input enables them.
    pub async fn create_task(
        &self,
        owner_id: Uuid,
        input: CreateTask,
    ) -> Result<Task, SchedulerError> {
        self.ensure_name_free(&owner_id, &input.name, None).await?;
        Self::validate_endpoint(&input.endpoint)?;
        validate_frequency(&input.cron, &input.timezone, &self.policy)?;

        let mut task = Task::new(owner_id, input.name, input.method, input.endpoint, input.cron)
            .with_timezone(input.timezone)
            .with_note(input.note)
            .enabled(input.is_enable);
        task.headers = input.headers;
        task.body = input.body;
        task.alert = input.alert;

        self.store.insert(&task).await?;
        self.scheduler.task_created(&task).await?;
        info!("created task '{}' ({})", task.name, task.id);
        Ok(task)
    }

    /// Apply a partial update to an owner's task.
    ///
    /// When the cron expression changes, the previous expression is added to
    /// the task's cron history so the scheduler can clean up the schedule
    /// registered under it.
    pub async fn update_task(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: UpdateTask,
    ) -> Result<Task, SchedulerError> {
        if let Some(name) = &changes.name {
            self.ensure_name_free(&owner_id, name, Some(&id)).await?;
        }
        if let Some(endpoint) = &changes.endpoint {
            Self::validate_endpoint(endpoint)?;
        }
        if let Some(timezone) = &changes.timezone {
            resolve_timezone(timezone)?;
        }

        let old = self
            .store
            .get(&id)
            .await?
            .filter(|t| t.owner_id == owner_id)
            .ok_or(SchedulerError::TaskNotFound(id))?;

        let mut new = old.clone();
        if let Some(name) = changes.name {
            new.name = name;
        }
        if let Some(method) = changes.method {
            new.method = method;
        }
        if let Some(endpoint) = changes.endpoint {
            new.endpoint = endpoint;
        }
        if let Some(timezone) = changes.timezone {
            new.timezone = timezone;
        }
        if let Some(headers) = changes.headers {
            new.headers = Some(headers);
        }
        if let Some(body) = changes.body {
            new.body = Some(body);
        }
        if let Some(note) = changes.note {
            new.note = note;
        }
        if let Some(alert) = changes.alert {
            new.alert = Some(alert);
        }
        if let Some(is_enable) = changes.is_enable {
            new.is_enable = is_enable;
        }
        if let Some(cron) = changes.cron {
            validate_frequency(&cron, &new.timezone, &self.policy)?;
            if cron != old.cron {
                new.push_cron_history(old.cron.clone());
            }
            new.cron = cron;
        }
        new.updated_at = Utc::now();

        self.store.update(&new).await?;
        self.scheduler.task_updated(&old, &new).await?;
        Ok(new)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

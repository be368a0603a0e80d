//! Probe task definition.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HTTP methods a probe can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    /// Uppercase wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure-alert settings carried on a task.
///
/// Only the threshold is stored here; alert delivery lives outside the
/// execution engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Consecutive failures before an alert would fire.
    #[serde(default)]
    pub failure_threshold: u32,
}

/// A recurring HTTP probe definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
    /// Task name, unique within the owner's tasks.
    pub name: String,
    /// Free-form description.
    pub note: String,
    /// Active cron expression.
    pub cron: String,
    /// Previously active cron expressions, kept so stale repeating schedules
    /// can be located and removed after edits.
    pub cron_history: BTreeSet<String>,
    /// Target URL.
    pub endpoint: String,
    /// HTTP method for the probe.
    pub method: HttpMethod,
    /// Request headers as a serialized JSON object.
    pub headers: Option<String>,
    /// Request body.
    pub body: Option<String>,
    /// IANA timezone the cron expression is evaluated in. Empty means UTC.
    pub timezone: String,
    /// Alert settings.
    pub alert: Option<AlertConfig>,
    /// Whether the schedule is active.
    pub is_enable: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task. Tasks start disabled.
    pub fn new(
        owner_id: Uuid,
        name: impl Into<String>,
        method: HttpMethod,
        endpoint: impl Into<String>,
        cron: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            note: String::new(),
            cron: cron.into(),
            cron_history: BTreeSet::new(),
            endpoint: endpoint.into(),
            method,
            headers: None,
            body: None,
            timezone: String::new(),
            alert: None,
            is_enable: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the request headers (serialized JSON object).
    pub fn with_headers(mut self, headers: impl Into<String>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the schedule timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Set the description.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Set the alert settings.
    pub fn with_alert(mut self, alert: AlertConfig) -> Self {
        self.alert = Some(alert);
        self
    }

    /// Set whether the schedule is active.
    pub fn enabled(mut self, is_enable: bool) -> Self {
        self.is_enable = is_enable;
        self
    }

    /// Every cron pattern this task may hold a repeating schedule under:
    /// the active expression plus all historical ones.
    pub fn schedule_patterns(&self) -> BTreeSet<String> {
        let mut patterns = self.cron_history.clone();
        patterns.insert(self.cron.clone());
        patterns
    }

    /// Record a previously active cron expression.
    pub fn push_cron_history(&mut self, previous: impl Into<String>) {
        self.cron_history.insert(previous.into());
    }
}

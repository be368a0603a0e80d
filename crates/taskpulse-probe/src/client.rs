//! Instrumented outbound HTTP client.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use taskpulse_core::{HttpMethod, Task};

use crate::error::ProbeError;

/// Probe client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every probe.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "taskpulse/0.1".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Measurements taken by the instrumented client for one response.
#[derive(Debug, Clone, Copy)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Elapsed wall-clock time for the full request, in milliseconds.
    pub duration_ms: u64,
    /// Response body size in bytes.
    pub response_size_bytes: u64,
}

/// HTTP client that measures duration and response size per request.
///
/// The only per-request state is a start marker taken just before send; the
/// measurements ride on the returned [`ProbeResponse`] so callers never
/// re-time a request.
pub struct ProbeClient {
    client: Client,
}

impl ProbeClient {
    /// Create a new probe client.
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Execute a task's probe request.
    pub async fn probe(&self, task: &Task) -> Result<ProbeResponse, ProbeError> {
        let url = url::Url::parse(&task.endpoint).map_err(|e| {
            ProbeError::Request(format!("invalid endpoint '{}': {}", task.endpoint, e))
        })?;

        let mut request = self.client.request(reqwest_method(task.method), url);

        if let Some(headers) = task.headers.as_deref().filter(|h| !h.trim().is_empty()) {
            let parsed: HashMap<String, String> = serde_json::from_str(headers)
                .map_err(|e| ProbeError::Request(format!("malformed headers: {}", e)))?;
            for (name, value) in parsed {
                request = request.header(&name, &value);
            }
        }

        if let Some(body) = task.body.clone().filter(|b| !b.is_empty()) {
            request = request.body(body);
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let measured = ProbeResponse {
            status,
            duration_ms: started.elapsed().as_millis() as u64,
            response_size_bytes: body.len() as u64,
        };
        debug!(
            "probe {} {} -> {} in {} ms, {} bytes",
            task.method, task.endpoint, measured.status, measured.duration_ms,
            measured.response_size_bytes
        );
        Ok(measured)
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Head => reqwest::Method::HEAD,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

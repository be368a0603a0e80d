//! Probe errors.

use thiserror::Error;

/// Probe error types.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Client(String),

    /// The request could not be built from the task definition.
    #[error("bad probe request: {0}")]
    Request(String),

    /// Network-level failure: connect, DNS, TLS, timeout, or body read.
    #[error("probe transport failure: {0}")]
    Transport(String),
}

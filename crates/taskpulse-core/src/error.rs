//! Persistence errors.

use thiserror::Error;
use uuid::Uuid;

/// Store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Task not found.
    #[error("task not found: {0}")]
    TaskNotFound(Uuid),

    /// Log not found.
    #[error("log not found: {0}")]
    LogNotFound(Uuid),

    /// Backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

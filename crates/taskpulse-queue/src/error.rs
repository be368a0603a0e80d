//! Queue errors.

use thiserror::Error;

/// Queue error types.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Schedule pattern or timezone rejected at registration.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Dispatch channel is closed.
    #[error("queue channel closed")]
    ChannelClosed,

    /// Storage failure inside a handler.
    #[error("storage error: {0}")]
    Storage(String),

    /// Worker error.
    #[error("worker error: {0}")]
    Worker(String),
}

//! # Taskpulse Core
//!
//! Domain model for the scheduled HTTP probe engine.
//!
//! ## Contents
//!
//! - Probe task definitions ([`Task`])
//! - Execution outcome records ([`TaskLog`])
//! - Persistence traits with in-memory implementations

pub mod error;
pub mod log;
pub mod store;
pub mod task;

pub use error::StoreError;
pub use log::{TaskLog, FAILURE_STATUS_CODE};
pub use store::{MemoryTaskLogStore, MemoryTaskStore, TaskLogStore, TaskStore};
pub use task::{AlertConfig, HttpMethod, Task};

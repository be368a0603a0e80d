//! # Taskpulse Scheduler
//!
//! Keeps the repeating job queue consistent with user-edited task
//! definitions, and hosts the mutation gate the task API calls through.

pub mod error;
pub mod scheduler;
pub mod service;

pub use error::SchedulerError;
pub use scheduler::Scheduler;
pub use service::{CreateTask, TaskService, UpdateTask};

//! # Taskpulse Queue
//!
//! In-process job queue for the probe engine.
//!
//! ## Features
//!
//! - Repeating schedules driven by cron patterns, keyed by job id + pattern
//! - Worker pools with semaphore-bounded concurrency
//! - Bounded retry with exponential backoff

pub mod config;
pub mod error;
pub mod job;
pub mod repeat;
pub mod retry;
pub mod worker;

pub use config::QueueConfig;
pub use error::QueueError;
pub use job::{Job, ScheduleKey};
pub use repeat::{RepeatQueue, RepeatingJobQueue};
pub use retry::RetryPolicy;
pub use worker::{JobHandler, WorkerPool};

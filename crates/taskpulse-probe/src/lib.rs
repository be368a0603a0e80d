//! # Taskpulse Probe
//!
//! The execution side of the engine: an instrumented outbound HTTP client,
//! the worker that performs probes and always emits a log payload, and the
//! worker that persists logs under the retention cap.

pub mod client;
pub mod error;
pub mod executor;
pub mod log_writer;

pub use client::{ProbeClient, ProbeConfig, ProbeResponse};
pub use error::ProbeError;
pub use executor::ProbeExecutor;
pub use log_writer::{LogWrite, LogWriter, DEFAULT_MAX_LOGS_PER_TASK};

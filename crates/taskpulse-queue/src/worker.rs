//! Worker pools draining queue channels.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use crate::error::QueueError;
use crate::job::Job;
use crate::retry::RetryPolicy;

/// Handles jobs drained from a queue channel.
#[async_trait]
pub trait JobHandler<P>: Send + Sync {
    /// Process one job.
    async fn handle(&self, job: &Job<P>) -> Result<(), QueueError>;
}

/// Pool of workers draining one channel with bounded concurrency.
///
/// With a retry policy set, a failed job is re-enqueued after the policy's
/// backoff delay until the attempt ceiling is reached, then dropped with a
/// warning. Completed jobs are not retained anywhere.
pub struct WorkerPool<P> {
    name: String,
    semaphore: Arc<Semaphore>,
    retry: Option<RetryPolicy>,
    processed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    _marker: std::marker::PhantomData<fn(P)>,
}

impl<P: Send + 'static> WorkerPool<P> {
    /// Create a pool with the given concurrency.
    pub fn new(name: impl Into<String>, concurrency: usize) -> Self {
        Self {
            name: name.into(),
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            retry: None,
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            _marker: std::marker::PhantomData,
        }
    }

    /// Attach a retry policy for failed jobs.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Jobs handled successfully.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    /// Handler failures, counting each attempt.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Jobs abandoned after exhausting retries.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Drain the channel until shutdown is broadcast or the channel closes.
    ///
    /// `retry_tx` must be a sender for the same channel as `rx`; it is used
    /// to re-enqueue jobs when a retry policy is set.
    pub async fn run<H: JobHandler<P> + 'static>(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<Job<P>>,
        retry_tx: mpsc::Sender<Job<P>>,
        handler: Arc<H>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        info!(
            "{} pool started with {} workers",
            self.name,
            self.semaphore.available_permits()
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("{} pool shutting down", self.name);
                    break;
                }
                job = rx.recv() => {
                    let Some(job) = job else {
                        info!("{} pool channel closed", self.name);
                        break;
                    };
                    let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let pool = self.clone();
                    let handler = handler.clone();
                    let retry_tx = retry_tx.clone();
                    tokio::spawn(async move {
                        pool.process(job, handler.as_ref(), &retry_tx).await;
                        drop(permit);
                    });
                }
            }
        }
    }

    async fn process<H: JobHandler<P>>(
        &self,
        job: Job<P>,
        handler: &H,
        retry_tx: &mpsc::Sender<Job<P>>,
    ) {
        debug!(
            "{} processing job {} (attempt {})",
            self.name, job.id, job.attempt
        );

        match handler.handle(&job).await {
            Ok(()) => {
                self.processed.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::SeqCst);
                match self.retry {
                    Some(policy) if policy.allows(job.attempt) => {
                        let delay = policy.delay_after(job.attempt);
                        warn!(
                            "{} job {} failed on attempt {}, retrying in {:?}: {}",
                            self.name, job.id, job.attempt, delay, e
                        );
                        let name = self.name.clone();
                        let retry_tx = retry_tx.clone();
                        let retry = job.next_attempt();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            if retry_tx.send(retry).await.is_err() {
                                warn!("{} channel closed, dropping retried job", name);
                            }
                        });
                    }
                    _ => {
                        self.dropped.fetch_add(1, Ordering::SeqCst);
                        error!(
                            "{} job {} dropped after {} attempts: {}",
                            self.name, job.id, job.attempt, e
                        );
                    }
                }
            }
        }
    }
}

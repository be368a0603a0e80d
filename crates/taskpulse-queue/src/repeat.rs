//! Repeating-schedule registry and dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use taskpulse_cron::{parse_schedule, resolve_timezone};

use crate::error::QueueError;
use crate::job::{Job, ScheduleKey};

/// Handle to a queue that re-dispatches jobs on a cron pattern.
///
/// The payload registered with a schedule is a snapshot: every dispatch for
/// that schedule carries the value passed to [`register`], so edits to the
/// underlying definition reach the queue only through re-registration.
///
/// [`register`]: RepeatingJobQueue::register
#[async_trait]
pub trait RepeatingJobQueue<P>: Send + Sync {
    /// Register a repeating schedule. An existing schedule with the same key
    /// is replaced.
    async fn register(
        &self,
        key: ScheduleKey,
        timezone: &str,
        payload: P,
    ) -> Result<(), QueueError>;

    /// Remove a schedule. Returns `false` when no schedule matched the key.
    async fn remove(&self, key: &ScheduleKey) -> Result<bool, QueueError>;

    /// Keys of all live schedules.
    async fn active_keys(&self) -> Vec<ScheduleKey>;
}

struct ScheduleEntry {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// In-process repeating-job broker.
///
/// Each registered schedule runs its own dispatch loop: sleep until the next
/// fire time of the cron pattern in the schedule's timezone, then push a job
/// carrying the due time into the dispatch channel. There is no central
/// calendar-polling loop.
pub struct RepeatQueue<P> {
    schedules: RwLock<HashMap<ScheduleKey, ScheduleEntry>>,
    dispatch_tx: mpsc::Sender<Job<P>>,
}

impl<P: Clone + Send + Sync + 'static> RepeatQueue<P> {
    /// Create a broker dispatching into the given channel.
    pub fn new(dispatch_tx: mpsc::Sender<Job<P>>) -> Arc<Self> {
        Arc::new(Self {
            schedules: RwLock::new(HashMap::new()),
            dispatch_tx,
        })
    }

    /// Number of live schedules.
    pub async fn len(&self) -> usize {
        self.schedules.read().await.len()
    }

    /// Check if no schedules are registered.
    pub async fn is_empty(&self) -> bool {
        self.schedules.read().await.is_empty()
    }

    /// Cancel every schedule loop.
    pub async fn shutdown(&self) {
        let mut schedules = self.schedules.write().await;
        for (key, entry) in schedules.drain() {
            let _ = entry.cancel.send(true);
            entry.handle.abort();
            debug!("schedule {} cancelled", key);
        }
    }
}

#[async_trait]
impl<P: Clone + Send + Sync + 'static> RepeatingJobQueue<P> for RepeatQueue<P> {
    async fn register(
        &self,
        key: ScheduleKey,
        timezone: &str,
        payload: P,
    ) -> Result<(), QueueError> {
        let schedule =
            parse_schedule(&key.pattern).map_err(|e| QueueError::InvalidSchedule(e.to_string()))?;
        let tz =
            resolve_timezone(timezone).map_err(|e| QueueError::InvalidSchedule(e.to_string()))?;

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let dispatch_tx = self.dispatch_tx.clone();
        let loop_key = key.clone();

        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.after(&Utc::now().with_timezone(&tz)).next() else {
                    debug!("schedule {} exhausted", loop_key);
                    break;
                };
                let due_at = next.with_timezone(&Utc);
                let wait = (due_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = cancel_rx.changed() => break,
                }

                let job = Job::new(payload.clone()).with_due_at(due_at);
                if dispatch_tx.send(job).await.is_err() {
                    warn!("dispatch channel closed, stopping schedule {}", loop_key);
                    break;
                }
                debug!("dispatched job for schedule {} due {}", loop_key, due_at);
            }
        });

        let mut schedules = self.schedules.write().await;
        if let Some(previous) = schedules.insert(
            key.clone(),
            ScheduleEntry {
                cancel: cancel_tx,
                handle,
            },
        ) {
            let _ = previous.cancel.send(true);
            previous.handle.abort();
            debug!("replaced repeating schedule {}", key);
        }
        Ok(())
    }

    async fn remove(&self, key: &ScheduleKey) -> Result<bool, QueueError> {
        let mut schedules = self.schedules.write().await;
        match schedules.remove(key) {
            Some(entry) => {
                let _ = entry.cancel.send(true);
                entry.handle.abort();
                debug!("removed repeating schedule {}", key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn active_keys(&self) -> Vec<ScheduleKey> {
        self.schedules.read().await.keys().cloned().collect()
    }
}

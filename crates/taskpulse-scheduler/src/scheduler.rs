//! Reconciliation between task definitions and the repeating queue.

use std::sync::Arc;

use tracing::{debug, info, warn};

use taskpulse_core::Task;
use taskpulse_queue::{RepeatingJobQueue, ScheduleKey};

use crate::error::SchedulerError;

/// Keeps each enabled task paired with exactly one live repeating schedule.
///
/// The queue handle is injected at construction, so tests (and alternative
/// brokers) substitute their own implementation.
pub struct Scheduler {
    queue: Arc<dyn RepeatingJobQueue<Task>>,
}

impl Scheduler {
    /// Create a scheduler over a queue handle.
    pub fn new(queue: Arc<dyn RepeatingJobQueue<Task>>) -> Self {
        Self { queue }
    }

    /// Fields whose change requires the schedule to be rebuilt.
    fn needs_reschedule(old: &Task, new: &Task) -> bool {
        old.is_enable != new.is_enable
            || old.endpoint != new.endpoint
            || old.method != new.method
            || old.cron != new.cron
            || old.headers != new.headers
            || old.body != new.body
            || old.timezone != new.timezone
    }

    async fn start_schedule(&self, task: &Task) -> Result<(), SchedulerError> {
        let key = ScheduleKey::new(task.id.to_string(), task.cron.clone());
        self.queue
            .register(key, &task.timezone, task.clone())
            .await
            .map_err(SchedulerError::Queue)?;
        info!("registered schedule for task {} ({})", task.id, task.cron);
        Ok(())
    }

    /// Remove the task's current schedule and any orphan left behind by an
    /// earlier edit. Each removal is attempted independently; a miss counts
    /// as already stopped, and a transport failure is logged without
    /// aborting the rest.
    async fn stop_schedules(&self, task: &Task) {
        for pattern in task.schedule_patterns() {
            let key = ScheduleKey::new(task.id.to_string(), pattern);
            match self.queue.remove(&key).await {
                Ok(true) => debug!("removed schedule {}", key),
                Ok(false) => debug!("schedule {} already absent", key),
                Err(e) => warn!("failed to remove schedule {}: {}", key, e),
            }
        }
    }

    /// Called after a task is created.
    pub async fn task_created(&self, task: &Task) -> Result<(), SchedulerError> {
        if task.is_enable {
            self.start_schedule(task).await?;
        }
        Ok(())
    }

    /// Called after a task is updated, with the stored state from before
    /// and after the edit.
    ///
    /// The registered payload is the post-edit snapshot; until the next
    /// reschedule, in-flight schedules keep dispatching the snapshot they
    /// were registered with.
    pub async fn task_updated(&self, old: &Task, new: &Task) -> Result<(), SchedulerError> {
        if !Self::needs_reschedule(old, new) {
            return Ok(());
        }
        if old.is_enable {
            self.stop_schedules(old).await;
        }
        if new.is_enable {
            self.start_schedule(new).await?;
        }
        Ok(())
    }

    /// Rebuild queue registrations from stored tasks, e.g. at startup.
    /// Failures are logged and skipped; returns how many schedules went
    /// live.
    pub async fn resync(&self, tasks: &[Task]) -> usize {
        let mut registered = 0;
        for task in tasks.iter().filter(|t| t.is_enable) {
            match self.start_schedule(task).await {
                Ok(()) => registered += 1,
                Err(e) => warn!("resync skipped task {}: {}", task.id, e),
            }
        }
        info!("resynced {} enabled schedules", registered);
        registered
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

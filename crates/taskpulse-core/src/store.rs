//! Task and log persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::log::TaskLog;
use crate::task::Task;

/// Task store trait.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Load a task by ID.
    async fn get(&self, id: &Uuid) -> Result<Option<Task>, StoreError>;

    /// Find an owner's task by name.
    async fn find_by_name(&self, owner_id: &Uuid, name: &str) -> Result<Option<Task>, StoreError>;

    /// All tasks of an owner.
    async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Task>, StoreError>;

    /// All enabled tasks, across owners.
    async fn list_enabled(&self) -> Result<Vec<Task>, StoreError>;

    /// Persist a new task.
    async fn insert(&self, task: &Task) -> Result<(), StoreError>;

    /// Persist changes to an existing task.
    async fn update(&self, task: &Task) -> Result<(), StoreError>;
}

/// Log store trait.
#[async_trait]
pub trait TaskLogStore: Send + Sync {
    /// Oldest logs of a task, `created_at` ascending, at most `limit` rows.
    async fn find_oldest(&self, task_id: &Uuid, limit: usize) -> Result<Vec<TaskLog>, StoreError>;

    /// Number of logs held for a task.
    async fn count(&self, task_id: &Uuid) -> Result<usize, StoreError>;

    /// Persist a new log row.
    async fn insert(&self, log: &TaskLog) -> Result<(), StoreError>;

    /// Delete a log row by ID.
    async fn delete(&self, id: &Uuid) -> Result<(), StoreError>;
}

/// In-memory task store.
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get(&self, id: &Uuid) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(id).cloned())
    }

    async fn find_by_name(&self, owner_id: &Uuid, name: &str) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .values()
            .find(|t| t.owner_id == *owner_id && t.name == name)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<Task> = tasks
            .values()
            .filter(|t| t.owner_id == *owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(owned)
    }

    async fn list_enabled(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().filter(|t| t.is_enable).cloned().collect())
    }

    async fn insert(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&task.id) {
            return Err(StoreError::TaskNotFound(task.id));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }
}

/// In-memory log store. Insertion order is preserved so equal timestamps
/// still evict first-in-first-out.
pub struct MemoryTaskLogStore {
    logs: RwLock<Vec<TaskLog>>,
}

impl MemoryTaskLogStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryTaskLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskLogStore for MemoryTaskLogStore {
    async fn find_oldest(&self, task_id: &Uuid, limit: usize) -> Result<Vec<TaskLog>, StoreError> {
        let logs = self.logs.read().await;
        let mut rows: Vec<TaskLog> = logs.iter().filter(|l| l.task_id == *task_id).cloned().collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn count(&self, task_id: &Uuid) -> Result<usize, StoreError> {
        let logs = self.logs.read().await;
        Ok(logs.iter().filter(|l| l.task_id == *task_id).count())
    }

    async fn insert(&self, log: &TaskLog) -> Result<(), StoreError> {
        let mut logs = self.logs.write().await;
        logs.push(log.clone());
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), StoreError> {
        let mut logs = self.logs.write().await;
        let before = logs.len();
        logs.retain(|l| l.id != *id);
        if logs.len() == before {
            return Err(StoreError::LogNotFound(*id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::HttpMethod;
    use chrono::Utc;

    fn task(owner: Uuid, name: &str) -> Task {
        Task::new(owner, name, HttpMethod::Get, "https://example.com", "0 * * * *")
    }

    #[tokio::test]
    async fn test_task_store_insert_and_get() {
        let store = MemoryTaskStore::new();
        let t = task(Uuid::new_v4(), "ping");

        store.insert(&t).await.unwrap();
        let loaded = store.get(&t.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "ping");
    }

    #[tokio::test]
    async fn test_task_store_find_by_name_scoped_to_owner() {
        let store = MemoryTaskStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.insert(&task(alice, "ping")).await.unwrap();

        assert!(store.find_by_name(&alice, "ping").await.unwrap().is_some());
        assert!(store.find_by_name(&bob, "ping").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_task_store_update_missing() {
        let store = MemoryTaskStore::new();
        let t = task(Uuid::new_v4(), "ping");

        let result = store.update(&t).await;
        assert!(matches!(result, Err(StoreError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_task_store_list_by_owner() {
        let store = MemoryTaskStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.insert(&task(alice, "one")).await.unwrap();
        store.insert(&task(alice, "two")).await.unwrap();
        store.insert(&task(bob, "three")).await.unwrap();

        let owned = store.list_by_owner(&alice).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|t| t.owner_id == alice));
    }

    #[tokio::test]
    async fn test_task_store_list_enabled() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        store.insert(&task(owner, "off")).await.unwrap();
        store.insert(&task(owner, "on").enabled(true)).await.unwrap();

        let enabled = store.list_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "on");
    }

    #[tokio::test]
    async fn test_log_store_find_oldest_ordering() {
        let store = MemoryTaskLogStore::new();
        let task_id = Uuid::new_v4();
        let now = Utc::now();

        for status in [201u16, 202, 203] {
            let log = TaskLog::new(
                task_id,
                "https://example.com",
                HttpMethod::Get,
                status,
                1,
                1,
                now,
                now,
            );
            store.insert(&log).await.unwrap();
        }

        let oldest = store.find_oldest(&task_id, 2).await.unwrap();
        assert_eq!(oldest.len(), 2);
        assert_eq!(oldest[0].status_code, 201);
        assert_eq!(oldest[1].status_code, 202);
        assert_eq!(store.count(&task_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_log_store_delete() {
        let store = MemoryTaskLogStore::new();
        let task_id = Uuid::new_v4();
        let now = Utc::now();
        let log = TaskLog::new(task_id, "https://example.com", HttpMethod::Get, 200, 1, 1, now, now);

        store.insert(&log).await.unwrap();
        store.delete(&log.id).await.unwrap();
        assert_eq!(store.count(&task_id).await.unwrap(), 0);

        let result = store.delete(&log.id).await;
        assert!(matches!(result, Err(StoreError::LogNotFound(_))));
    }
}

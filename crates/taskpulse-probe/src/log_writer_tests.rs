use super::*;
use taskpulse_core::MemoryTaskLogStore;

fn write(task_id: Uuid, status_code: u16) -> LogWrite {
    let now = Utc::now();
    LogWrite {
        task_id,
        endpoint: "https://example.com".to_string(),
        method: HttpMethod::Get,
        status_code,
        duration_ms: 1,
        response_size_bytes: 1,
        scheduled_at: now,
        executed_at: now,
    }
}

#[tokio::test]
async fn test_insert_below_cap() {
    let store = Arc::new(MemoryTaskLogStore::new());
    let writer = LogWriter::new(store.clone(), 10);
    let task_id = Uuid::new_v4();

    writer.persist(&write(task_id, 200)).await.unwrap();
    assert_eq!(store.count(&task_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_cap_evicts_oldest() {
    let store = Arc::new(MemoryTaskLogStore::new());
    let writer = LogWriter::new(store.clone(), 2);
    let task_id = Uuid::new_v4();

    // Three writes against a cap of two: the first row must fall out.
    writer.persist(&write(task_id, 201)).await.unwrap();
    writer.persist(&write(task_id, 202)).await.unwrap();
    writer.persist(&write(task_id, 203)).await.unwrap();

    assert_eq!(store.count(&task_id).await.unwrap(), 2);
    let remaining = store.find_oldest(&task_id, 10).await.unwrap();
    let statuses: Vec<u16> = remaining.iter().map(|l| l.status_code).collect();
    assert_eq!(statuses, vec![202, 203]);
}

#[tokio::test]
async fn test_cap_is_per_task() {
    let store = Arc::new(MemoryTaskLogStore::new());
    let writer = LogWriter::new(store.clone(), 1);
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    writer.persist(&write(first, 200)).await.unwrap();
    writer.persist(&write(second, 200)).await.unwrap();

    assert_eq!(store.count(&first).await.unwrap(), 1);
    assert_eq!(store.count(&second).await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_writes_never_overshoot_cap() {
    let store = Arc::new(MemoryTaskLogStore::new());
    let writer = Arc::new(LogWriter::new(store.clone(), 2));
    let task_id = Uuid::new_v4();

    // Start at the cap, then race a batch of writers for the same task.
    writer.persist(&write(task_id, 200)).await.unwrap();
    writer.persist(&write(task_id, 200)).await.unwrap();

    let mut handles = Vec::new();
    for status in 210..218u16 {
        let writer = writer.clone();
        handles.push(tokio::spawn(async move {
            writer.persist(&write(task_id, status)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.count(&task_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_handle_maps_store_failure() {
    struct DownStore;

    #[async_trait]
    impl TaskLogStore for DownStore {
        async fn find_oldest(
            &self,
            _task_id: &Uuid,
            _limit: usize,
        ) -> Result<Vec<TaskLog>, StoreError> {
            Err(StoreError::Backend("log store offline".to_string()))
        }

        async fn count(&self, _task_id: &Uuid) -> Result<usize, StoreError> {
            Err(StoreError::Backend("log store offline".to_string()))
        }

        async fn insert(&self, _log: &TaskLog) -> Result<(), StoreError> {
            Err(StoreError::Backend("log store offline".to_string()))
        }

        async fn delete(&self, _id: &Uuid) -> Result<(), StoreError> {
            Err(StoreError::Backend("log store offline".to_string()))
        }
    }

    let writer = LogWriter::new(Arc::new(DownStore), 2);
    let job = Job::new(write(Uuid::new_v4(), 200));

    let result = writer.handle(&job).await;
    assert!(matches!(result, Err(QueueError::Storage(_))));
}

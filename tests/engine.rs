//! End-to-end test: a created task is dispatched on schedule, probed over
//! HTTP, and its outcome lands in the log store under the retention cap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskpulse_core::{
    HttpMethod, MemoryTaskLogStore, MemoryTaskStore, TaskLogStore, FAILURE_STATUS_CODE,
};
use taskpulse_cron::FrequencyPolicy;
use taskpulse_probe::{LogWriter, ProbeClient, ProbeConfig, ProbeExecutor};
use taskpulse_queue::{RepeatQueue, RetryPolicy, WorkerPool};
use taskpulse_scheduler::{CreateTask, Scheduler, TaskService, UpdateTask};

struct Engine {
    log_store: Arc<MemoryTaskLogStore>,
    service: TaskService,
    shutdown_tx: broadcast::Sender<()>,
}

/// Wire up the full engine against in-memory stores, with a policy loose
/// enough to allow every-second schedules.
fn engine(max_logs_per_task: usize) -> Engine {
    let task_store = Arc::new(MemoryTaskStore::new());
    let log_store = Arc::new(MemoryTaskLogStore::new());

    let (exec_tx, exec_rx) = mpsc::channel(64);
    let (log_tx, log_rx) = mpsc::channel(64);
    let repeat_queue = RepeatQueue::new(exec_tx.clone());

    let client = ProbeClient::new(&ProbeConfig::default()).unwrap();
    let executor = Arc::new(ProbeExecutor::new(client, log_tx.clone()));
    let log_writer = Arc::new(LogWriter::new(log_store.clone(), max_logs_per_task));

    let (shutdown_tx, _) = broadcast::channel(1);
    let execution_pool = Arc::new(WorkerPool::new("execution", 1));
    let log_pool = Arc::new(WorkerPool::new("log-write", 1).with_retry(RetryPolicy {
        max_attempts: 3,
        base_delay_ms: 10,
    }));

    tokio::spawn(execution_pool.run(exec_rx, exec_tx, executor, shutdown_tx.subscribe()));
    tokio::spawn(log_pool.run(log_rx, log_tx, log_writer, shutdown_tx.subscribe()));

    let scheduler = Arc::new(Scheduler::new(repeat_queue));
    let policy = FrequencyPolicy {
        min_interval_secs: 0,
        sample_count: 1,
    };
    let service = TaskService::new(task_store, scheduler, policy);

    Engine {
        log_store,
        service,
        shutdown_tx,
    }
}

async fn wait_for_logs(
    log_store: &MemoryTaskLogStore,
    task_id: &Uuid,
    at_least: usize,
    deadline: Duration,
) -> usize {
    let started = std::time::Instant::now();
    loop {
        let count = log_store.count(task_id).await.unwrap();
        if count >= at_least || started.elapsed() > deadline {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn test_scheduled_probe_produces_logs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let engine = engine(10);
    let task = engine
        .service
        .create_task(
            Uuid::new_v4(),
            CreateTask {
                name: "ping".to_string(),
                method: HttpMethod::Get,
                endpoint: format!("{}/ping", server.uri()),
                cron: "* * * * * *".to_string(),
                timezone: String::new(),
                headers: None,
                body: None,
                note: String::new(),
                alert: None,
                is_enable: true,
            },
        )
        .await
        .unwrap();

    let count = wait_for_logs(&engine.log_store, &task.id, 1, Duration::from_secs(5)).await;
    assert!(count >= 1, "no log written within deadline");

    let logs = engine.log_store.find_oldest(&task.id, 10).await.unwrap();
    assert_eq!(logs[0].status_code, 200);
    assert_eq!(logs[0].response_size_bytes, 4);
    assert_eq!(logs[0].task_id, task.id);

    let _ = engine.shutdown_tx.send(());
}

#[tokio::test]
async fn test_unreachable_endpoint_still_logs_sentinel() {
    let engine = engine(10);
    let task = engine
        .service
        .create_task(
            Uuid::new_v4(),
            CreateTask {
                name: "dead".to_string(),
                method: HttpMethod::Get,
                endpoint: "http://127.0.0.1:1/void".to_string(),
                cron: "* * * * * *".to_string(),
                timezone: String::new(),
                headers: None,
                body: None,
                note: String::new(),
                alert: None,
                is_enable: true,
            },
        )
        .await
        .unwrap();

    let count = wait_for_logs(&engine.log_store, &task.id, 1, Duration::from_secs(5)).await;
    assert!(count >= 1, "failure was not logged");

    let logs = engine.log_store.find_oldest(&task.id, 10).await.unwrap();
    assert_eq!(logs[0].status_code, FAILURE_STATUS_CODE);
    assert_eq!(logs[0].duration_ms, 0);
    assert_eq!(logs[0].response_size_bytes, 0);

    let _ = engine.shutdown_tx.send(());
}

#[tokio::test]
async fn test_retention_cap_holds_under_repeated_fires() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let engine = engine(2);
    let owner = Uuid::new_v4();
    let task = engine
        .service
        .create_task(
            owner,
            CreateTask {
                name: "capped".to_string(),
                method: HttpMethod::Get,
                endpoint: format!("{}/ping", server.uri()),
                cron: "* * * * * *".to_string(),
                timezone: String::new(),
                headers: None,
                body: None,
                note: String::new(),
                alert: None,
                is_enable: true,
            },
        )
        .await
        .unwrap();

    // Reach the cap, then let several more fires land on top of it.
    wait_for_logs(&engine.log_store, &task.id, 2, Duration::from_secs(5)).await;
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // Disable so the count stops moving while we assert.
    engine
        .service
        .update_task(
            owner,
            task.id,
            UpdateTask {
                is_enable: Some(false),
                ..UpdateTask::default()
            },
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let count = engine.log_store.count(&task.id).await.unwrap();
    assert_eq!(count, 2, "retention cap exceeded or never reached");

    // The surviving rows are the most recent ones.
    let logs = engine.log_store.find_oldest(&task.id, 10).await.unwrap();
    assert!(logs[0].created_at <= logs[1].created_at);

    let _ = engine.shutdown_tx.send(());
}

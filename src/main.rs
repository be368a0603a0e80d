//! taskpulse - scheduled HTTP probe engine.
//!
//! Main entry point: wires the stores, the repeating queue, the worker
//! pools, and the scheduler together and runs until interrupted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use taskpulse_core::{MemoryTaskLogStore, MemoryTaskStore, TaskStore};
use taskpulse_probe::{LogWriter, ProbeClient, ProbeExecutor};
use taskpulse_queue::{RepeatQueue, WorkerPool};
use taskpulse_scheduler::{CreateTask, Scheduler, TaskService};

mod config;
use config::AppConfig;

/// Taskpulse CLI.
#[derive(Parser)]
#[command(name = "taskpulse")]
#[command(about = "Scheduled HTTP probe engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine in the foreground.
    Run {
        /// Configuration file path.
        #[arg(short, long, default_value = "config/default.toml")]
        config: PathBuf,

        /// TOML file of task definitions to create at startup.
        #[arg(long)]
        tasks: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, tasks } => run(&config, tasks.as_deref()).await,
    }
}

async fn run(config_path: &Path, tasks_path: Option<&Path>) -> anyhow::Result<()> {
    let config = if config_path.exists() {
        AppConfig::load(config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?
    } else {
        info!("no config file at {}, using defaults", config_path.display());
        AppConfig::default()
    };

    let task_store = Arc::new(MemoryTaskStore::new());
    let log_store = Arc::new(MemoryTaskLogStore::new());

    let (exec_tx, exec_rx) = mpsc::channel(config.queue.channel_capacity);
    let (log_tx, log_rx) = mpsc::channel(config.queue.channel_capacity);
    let repeat_queue = RepeatQueue::new(exec_tx.clone());

    let client = ProbeClient::new(&config.probe)?;
    let executor = Arc::new(ProbeExecutor::new(client, log_tx.clone()));
    let log_writer = Arc::new(LogWriter::new(
        log_store.clone(),
        config.retention.max_logs_per_task,
    ));

    let (shutdown_tx, _) = broadcast::channel(1);
    let execution_pool = Arc::new(WorkerPool::new("execution", config.queue.execution_workers));
    let log_pool = Arc::new(
        WorkerPool::new("log-write", config.queue.log_workers).with_retry(config.queue.log_retry),
    );

    let mut handles = Vec::new();
    handles.push(tokio::spawn(execution_pool.clone().run(
        exec_rx,
        exec_tx.clone(),
        executor,
        shutdown_tx.subscribe(),
    )));
    handles.push(tokio::spawn(log_pool.clone().run(
        log_rx,
        log_tx.clone(),
        log_writer,
        shutdown_tx.subscribe(),
    )));

    let scheduler = Arc::new(Scheduler::new(repeat_queue.clone()));
    let service = TaskService::new(task_store.clone(), scheduler.clone(), config.frequency);

    let enabled = task_store.list_enabled().await?;
    scheduler.resync(&enabled).await;

    if let Some(path) = tasks_path {
        seed_tasks(&service, path).await?;
    }

    info!("taskpulse running; press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl-c")?;

    info!("shutting down");
    repeat_queue.shutdown().await;
    let _ = shutdown_tx.send(());
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

/// Seed file: an optional owner id plus `[[task]]` tables.
#[derive(Deserialize)]
struct SeedFile {
    #[serde(default)]
    owner: Option<Uuid>,
    #[serde(rename = "task", default)]
    tasks: Vec<CreateTask>,
}

/// Create tasks from a seed file through the service, so definitions pass
/// the same validation gate as API mutations.
async fn seed_tasks(service: &TaskService, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading task seed file {}", path.display()))?;
    let seed: SeedFile = toml::from_str(&content)?;
    let owner = seed.owner.unwrap_or_else(Uuid::new_v4);

    for input in seed.tasks {
        let name = input.name.clone();
        match service.create_task(owner, input).await {
            Ok(task) => info!("seeded task '{}' ({})", task.name, task.id),
            Err(e) => warn!("skipping seeded task '{}': {}", name, e),
        }
    }
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use shuttle_core::{Queue, QueueConfig, Task, TaskError};
use tokio::sync::{Notify, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Pushes a batch of flaky demo tasks through a shuttle queue.
#[derive(Debug, Parser)]
#[command(name = "shuttle", version)]
struct Cli {
    /// JSON file with `queue`, `tasks` and `max_failures` keys.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the retry delay from the config file.
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Overrides the queue id from the config file.
    #[arg(long)]
    id: Option<String>,

    /// Number of demo tasks to push.
    #[arg(long)]
    tasks: Option<usize>,

    /// Task `i` fails `i % (max_failures + 1)` times before succeeding.
    #[arg(long)]
    max_failures: Option<u32>,

    /// Simulated work per execution.
    #[arg(long, default_value_t = 50)]
    work_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DemoConfig {
    #[serde(default)]
    queue: QueueConfig,
    #[serde(default = "default_tasks")]
    tasks: usize,
    #[serde(default = "default_max_failures")]
    max_failures: u32,
}

fn default_tasks() -> usize {
    5
}

fn default_max_failures() -> u32 {
    2
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            tasks: default_tasks(),
            max_failures: default_max_failures(),
        }
    }
}

impl DemoConfig {
    fn load(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match &cli.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                serde_json::from_str::<DemoConfig>(&raw)?
            }
            None => DemoConfig::default(),
        };

        if let Some(ms) = cli.retry_delay_ms {
            config.queue.retry_delay_ms = ms;
        }
        if let Some(id) = &cli.id {
            config.queue.id = Some(id.clone());
        }
        if let Some(tasks) = cli.tasks {
            config.tasks = tasks;
        }
        if let Some(max_failures) = cli.max_failures {
            config.max_failures = max_failures;
        }
        config.queue.validate()?;
        Ok(config)
    }
}

/// Demo task: sleeps, then fails until its failure budget is spent.
struct DemoTask {
    index: usize,
    work: Duration,
    remaining_failures: AtomicU32,
    done: Arc<Progress>,
}

struct Progress {
    succeeded: AtomicUsize,
    notify: Notify,
}

#[async_trait]
impl Task for DemoTask {
    async fn run(&self) -> Result<(), TaskError> {
        tokio::time::sleep(self.work).await;

        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(TaskError::failed(format!(
                "task {} intentional failure (left={left})",
                self.index
            )));
        }

        info!(task = self.index, "task succeeded");
        self.done.succeeded.fetch_add(1, Ordering::Relaxed);
        self.done.notify.notify_one();
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = DemoConfig::load(&cli)?;

    // (A) Queue and its stop channel
    let queue = Queue::from_config(&config.queue);
    let (stop_tx, stop_rx) = watch::channel(false);
    info!(queue = queue.id(), retry_delay = ?queue.retry_delay(), "queue created");

    // (B) Consumer loop on its own task
    let runner = tokio::spawn({
        let queue = queue.clone();
        async move { queue.run(stop_rx).await }
    });

    // (C) Producers
    let progress = Arc::new(Progress {
        succeeded: AtomicUsize::new(0),
        notify: Notify::new(),
    });
    let work = Duration::from_millis(cli.work_ms);
    for index in 0..config.tasks {
        let failures = index as u32 % (config.max_failures + 1);
        queue.push(Arc::new(DemoTask {
            index,
            work,
            remaining_failures: AtomicU32::new(failures),
            done: Arc::clone(&progress),
        }));
    }

    // (D) Wait until every task has succeeded, or Ctrl-C
    let all_done = async {
        while progress.succeeded.load(Ordering::Relaxed) < config.tasks {
            progress.notify.notified().await;
        }
    };
    tokio::select! {
        _ = all_done => info!("all tasks succeeded"),
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => warn!(pending = queue.len(), "interrupted, stopping queue"),
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c, stopping queue"),
        },
    }

    // (E) Stop, drain, and wait for the closed notification
    stop_tx.send_replace(true);
    queue.closed().wait().await;
    runner.await?;

    info!(
        succeeded = progress.succeeded.load(Ordering::Relaxed),
        total = config.tasks,
        "queue closed"
    );
    Ok(())
}

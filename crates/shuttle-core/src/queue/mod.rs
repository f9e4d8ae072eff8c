//! Queue module: buffer, run loop, retry scheduling and close notification.

mod buffer;
mod closed;
mod retry;
mod state;

pub use closed::Closed;
pub use retry::RetryPolicy;
pub use state::QueueState;

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};

use self::buffer::{Buffer, Dequeued};
use self::closed::CloseSignal;
use crate::config::QueueConfig;
use crate::error::TaskError;
use crate::task::{TaskRef, task_fn};

const GENERATED_ID_LEN: usize = 10;

/// State shared between queue handles, the stop watcher and retry timers.
pub(crate) struct Shared {
    id: String,
    retry: RetryPolicy,
    buffer: Buffer,
    closed: CloseSignal,
}

impl Shared {
    pub(crate) fn push(&self, task: TaskRef) {
        if !self.buffer.push(task) {
            trace!(queue = %self.id, "queue is closing, task dropped");
        }
    }
}

/// Single-consumer work queue.
///
/// Any number of producers call [`Queue::push`]; one owner drives
/// [`Queue::run`], which executes tasks one at a time in push order. A task
/// that returns `Err` is pushed again after the fixed retry delay, at the
/// tail of the buffer.
///
/// `Queue` is a cheap handle (`Arc` inside); clone it to hand out to
/// producers.
///
/// ```ignore
/// let queue = Queue::new(Duration::from_secs(1));
/// let (stop_tx, stop_rx) = watch::channel(false);
///
/// let runner = tokio::spawn({
///     let queue = queue.clone();
///     async move { queue.run(stop_rx).await }
/// });
///
/// queue.push_fn(|| async { Ok(()) });
///
/// stop_tx.send(true)?;
/// queue.closed().wait().await;
/// ```
#[derive(Clone)]
pub struct Queue {
    shared: Arc<Shared>,
}

impl Queue {
    /// New queue with a random diagnostic id.
    pub fn new(retry_delay: Duration) -> Self {
        Self::with_id(retry_delay, generate_id())
    }

    pub fn with_id(retry_delay: Duration, id: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                retry: RetryPolicy::fixed(retry_delay),
                buffer: Buffer::new(),
                closed: CloseSignal::new(),
            }),
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        match &config.id {
            Some(id) => Self::with_id(config.retry_delay(), id.clone()),
            None => Self::new(config.retry_delay()),
        }
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn retry_delay(&self) -> Duration {
        self.shared.retry.delay()
    }

    /// Number of buffered tasks not yet handed to the run loop.
    pub fn len(&self) -> usize {
        self.shared.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Admits `task`.
    ///
    /// Once shutdown has begun the task is silently dropped; the caller is
    /// not told.
    pub fn push(&self, task: TaskRef) {
        self.shared.push(task);
    }

    pub fn push_fn<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.push(task_fn(f));
    }

    /// Handle that resolves once `run` has stopped dequeuing.
    pub fn closed(&self) -> Closed {
        self.shared.closed.subscribe()
    }

    pub fn state(&self) -> QueueState {
        if self.shared.closed.is_fired() {
            return QueueState::Stopped;
        }
        let flags = self.shared.buffer.flags();
        match (flags.started, flags.closing) {
            (false, _) => QueueState::Created,
            (true, false) => QueueState::Running,
            (true, true) => QueueState::Draining,
        }
    }

    /// Drives the queue until `stop` turns `true` (or its sender is
    /// dropped), then executes whatever is still buffered and returns.
    ///
    /// A stop sent before `run` is called is still honored. A task that is
    /// executing when stop arrives runs to completion.
    ///
    /// Meant to be awaited once. Further calls log a warning and return
    /// immediately.
    pub async fn run(&self, stop: watch::Receiver<bool>) {
        let shared = &self.shared;
        if !shared.buffer.begin_run() {
            warn!(queue = %shared.id, "queue is already running or has run, ignoring");
            return;
        }
        debug!(queue = %shared.id, "started queue");

        let already_stopped = *stop.borrow();
        if already_stopped {
            shared.buffer.close();
        }
        let watcher = tokio::spawn(watch_stop(Arc::downgrade(shared), stop));
        let _guard = RunGuard {
            shared: shared.as_ref(),
            watcher: watcher.abort_handle(),
        };

        while let Dequeued::Task(task) = shared.buffer.dequeue().await {
            if let Err(err) = task.run().await {
                let delay = shared.retry.delay();
                info!(queue = %shared.id, error = %err, delay = ?delay, "task failed, retry after delay");
                shared.retry.schedule(Arc::downgrade(shared), task);
            }
        }
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("id", &self.shared.id)
            .field("retry_delay", &self.shared.retry.delay())
            .field("state", &self.state())
            .field("pending", &self.len())
            .finish()
    }
}

async fn watch_stop(shared: Weak<Shared>, mut stop: watch::Receiver<bool>) {
    // `Err` means the sender was dropped, which counts as stop too.
    let _ = stop.wait_for(|stopped| *stopped).await;
    if let Some(shared) = shared.upgrade()
        && shared.buffer.close()
    {
        debug!(queue = %shared.id, pending = shared.buffer.len(), "stop requested, draining queue");
    }
}

/// Tears the run down on every exit path, including the `run` future being
/// dropped or a task panicking.
struct RunGuard<'a> {
    shared: &'a Shared,
    watcher: AbortHandle,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.watcher.abort();
        self.shared.buffer.close();
        if self.shared.closed.fire() {
            debug!(queue = %self.shared.id, "closed queue");
        }
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect()
}

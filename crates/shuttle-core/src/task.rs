//! Task abstraction.
//!
//! A task is an opaque, argument-less operation that reports success or a
//! `TaskError`. The queue holds tasks as `TaskRef` (`Arc<dyn Task>`) so a
//! failed task can be pushed again as the very same value.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;

/// A unit of work executed by the queue's run loop.
///
/// `run` may be called more than once for the same value: every failure
/// leads to another call after the retry delay.
#[async_trait]
pub trait Task: Send + Sync + 'static {
    async fn run(&self) -> Result<(), TaskError>;
}

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// Closure-backed task.
///
/// Wraps `F: Fn() -> Fut`, so each execution gets a fresh future. Shared
/// state across retries has to live in an `Arc` captured by the closure.
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn run(&self) -> Result<(), TaskError> {
        (self.f)().await
    }
}

/// Builds a `TaskRef` from a closure.
///
/// ```ignore
/// queue.push(task_fn(|| async { reconcile().await.map_err(TaskError::from) }));
/// ```
pub fn task_fn<F, Fut>(f: F) -> TaskRef
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    Arc::new(TaskFn::new(f))
}

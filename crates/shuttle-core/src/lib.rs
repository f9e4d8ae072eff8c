//! shuttle-core
//!
//! An in-process work queue that executes tasks one at a time, in the order
//! they were pushed, on a single consumer loop.
//!
//! # Modules
//! - **task**: the `Task` trait and closure-backed tasks (`TaskFn`, `task_fn`)
//! - **queue**: the `Queue` itself (buffer, run loop, retry timer, closed signal)
//! - **config**: serde-backed `QueueConfig`
//! - **error**: `TaskError` and `ConfigError`
//!
//! # Flow
//! ```text
//! producers ── push ──► buffer ◄── delayed push ── retry timer
//!                         │                            ▲
//!                         ▼                            │ Err
//!                      run loop ──── task.run() ───────┘
//!                         ▲
//!        stop signal ─────┘ (drain, then fire `closed`)
//! ```

pub mod config;
pub mod error;
pub mod queue;
pub mod task;

pub use config::QueueConfig;
pub use error::{ConfigError, TaskError};
pub use queue::{Closed, Queue, QueueState, RetryPolicy};
pub use task::{Task, TaskFn, TaskRef, task_fn};

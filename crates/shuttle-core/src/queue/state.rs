//! Lifecycle phase of a queue.

use serde::{Deserialize, Serialize};

/// Queue lifecycle.
///
/// State transitions:
/// - Created -> Running (`run` entered)
/// - Running -> Draining (stop observed, buffered tasks still executing)
/// - Draining -> Stopped (buffer empty, loop exited, `closed` fired)
///
/// Pushes are admitted in `Created` and `Running` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    /// Constructed, `run` not called yet.
    Created,

    /// Executing tasks and accepting pushes.
    Running,

    /// Shutdown requested; remaining buffered tasks are still executed.
    Draining,

    /// Run loop exited. Terminal.
    Stopped,
}

impl QueueState {
    pub fn is_terminal(self) -> bool {
        matches!(self, QueueState::Stopped)
    }

    /// Does `push` admit new tasks in this phase?
    pub fn accepts_pushes(self) -> bool {
        matches!(self, QueueState::Created | QueueState::Running)
    }
}

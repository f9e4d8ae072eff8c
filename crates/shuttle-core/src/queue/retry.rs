//! Retry scheduling for failed tasks.

use std::sync::Weak;
use std::time::Duration;

use tracing::trace;

use super::Shared;
use crate::task::TaskRef;

/// Retry policy for failed tasks.
///
/// Every failure waits the same `delay`; there is no attempt counter and
/// no escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Pushes `task` back into the queue after the delay.
    ///
    /// Fire-and-forget: the timer runs on its own tokio task and the caller
    /// never waits on it. The timer only holds a weak handle, so a queue
    /// whose every handle was dropped is not kept alive by pending retries.
    pub(crate) fn schedule(&self, shared: Weak<Shared>, task: TaskRef) {
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match shared.upgrade() {
                Some(shared) => shared.push(task),
                None => trace!("queue dropped before retry fired"),
            }
        });
    }
}

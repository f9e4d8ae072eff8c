//! Task buffer: pending tasks and the closing flag behind a single lock.
//!
//! # Wakeups
//! - `Notify::notify_one` stores a permit when nobody is parked yet, so a
//!   push that lands between the consumer's check and its `.await` is not lost.
//! - The consumer re-checks state after every wakeup (stale permits are fine).
//! - The lock is a `std::sync::Mutex` and is never held across an `.await`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::task::TaskRef;

#[derive(Default)]
struct BufferState {
    pending: VecDeque<TaskRef>,
    closing: bool,
    started: bool,
}

/// Lifecycle flags read under one lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Flags {
    pub(crate) started: bool,
    pub(crate) closing: bool,
}

/// What `dequeue` observed.
pub(crate) enum Dequeued {
    Task(TaskRef),
    Shutdown,
}

#[derive(Default)]
pub(crate) struct Buffer {
    state: Mutex<BufferState>,
    notify: Notify,
}

impl Buffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // A panic can only happen outside the critical sections, so the data is
    // consistent even when the lock is poisoned.
    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `task` unless closing. Returns whether it was admitted.
    pub(crate) fn push(&self, task: TaskRef) -> bool {
        {
            let mut state = self.lock();
            if state.closing {
                return false;
            }
            state.pending.push_back(task);
        }
        self.notify.notify_one();
        true
    }

    /// Marks the buffer closing and wakes the consumer.
    /// Returns `true` only for the call that flipped the flag.
    pub(crate) fn close(&self) -> bool {
        let first = {
            let mut state = self.lock();
            !std::mem::replace(&mut state.closing, true)
        };
        self.notify.notify_one();
        first
    }

    /// Run-once gate. Returns `true` only for the first caller.
    pub(crate) fn begin_run(&self) -> bool {
        let mut state = self.lock();
        !std::mem::replace(&mut state.started, true)
    }

    /// Waits for the next task, or for shutdown once nothing is buffered.
    ///
    /// Buffered tasks are always handed out before `Shutdown`, even after
    /// closing has been requested.
    pub(crate) async fn dequeue(&self) -> Dequeued {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.lock();
                if let Some(task) = state.pending.pop_front() {
                    return Dequeued::Task(task);
                }
                if state.closing {
                    return Dequeued::Shutdown;
                }
            }
            notified.await;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub(crate) fn flags(&self) -> Flags {
        let state = self.lock();
        Flags {
            started: state.started,
            closing: state.closing,
        }
    }
}

//! One-shot "queue stopped" notification.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Sender side, owned by the queue.
pub(crate) struct CloseSignal {
    fired: AtomicBool,
    tx: watch::Sender<bool>,
}

impl CloseSignal {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            fired: AtomicBool::new(false),
            tx,
        }
    }

    /// Fires the notification. Only the first call has any effect; returns
    /// whether this call was the one that fired.
    pub(crate) fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.tx.send_replace(true);
        true
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub(crate) fn subscribe(&self) -> Closed {
        Closed {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only handle that resolves once the queue's run loop has stopped.
///
/// Cheap to clone; every clone observes the same single firing, including
/// clones taken after it happened.
#[derive(Debug, Clone)]
pub struct Closed {
    rx: watch::Receiver<bool>,
}

impl Closed {
    /// Waits until the run loop has stopped. Returns immediately if it
    /// already has.
    pub async fn wait(&mut self) {
        // The sender lives as long as the queue; if the queue is dropped
        // without ever running there is nothing left to wait for.
        let _ = self.rx.wait_for(|closed| *closed).await;
    }

    pub fn is_closed(&self) -> bool {
        *self.rx.borrow()
    }
}

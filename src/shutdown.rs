//! Cooperative shutdown signal shared by all pipeline tasks.
//!
//! Every background task receives a [`ShutdownSignal`] at creation and
//! checks it at each loop iteration; all blocking waits in those loops are
//! bounded, so a trigger is observed within one wait cycle.

use tokio::sync::watch;

/// Owning side of the shutdown signal.
#[derive(Clone)]
pub struct Shutdown {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Signal shutdown. Idempotent.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side handed to a task.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is triggered (or the owner is gone).
    pub async fn recv(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        // An Err means the sender dropped, which we treat as shutdown too.
        let _ = self.rx.changed().await;
    }
}

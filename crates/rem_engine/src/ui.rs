use std::sync::{mpsc, Arc, Mutex};

use crate::TaskState;

/// Work the worker thread hands to the UI context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiNotice {
    /// Modal information dialog.
    Info { title: String, body: String },
    /// Modal error dialog.
    Error { title: String, body: String },
    /// Re-enable the run control and disable cancel. Sent exactly once per run.
    ResetControls { state: TaskState },
}

/// "Run this on the UI thread" primitive. Implementations must only enqueue;
/// the UI context executes the notice on its next tick.
pub trait UiScheduler: Send + Sync {
    fn schedule(&self, notice: UiNotice);
}

/// mpsc-backed scheduler drained by the UI timer.
#[derive(Clone)]
pub struct UiQueue {
    tx: mpsc::Sender<UiNotice>,
    rx: Arc<Mutex<mpsc::Receiver<UiNotice>>>,
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UiQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn try_recv(&self) -> Option<UiNotice> {
        self.rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .try_recv()
            .ok()
    }
}

impl UiScheduler for UiQueue {
    fn schedule(&self, notice: UiNotice) {
        let _ = self.tx.send(notice);
    }
}

use std::sync::{mpsc, Arc, Mutex};

use crate::LogMessage;

/// Unbounded, ordered conduit from any number of producer threads to the UI.
///
/// Cloning shares the same underlying queue. `publish` never blocks on the
/// consumer; `drain_all` returns everything published since the last drain.
#[derive(Clone)]
pub struct MessageChannel {
    tx: mpsc::Sender<LogMessage>,
    rx: Arc<Mutex<mpsc::Receiver<LogMessage>>>,
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn publish(&self, message: LogMessage) {
        // The receiver lives as long as any clone of the channel, so this cannot fail.
        let _ = self.tx.send(message);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.publish(LogMessage::info(text));
    }

    pub fn success(&self, text: impl Into<String>) {
        self.publish(LogMessage::success(text));
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.publish(LogMessage::warning(text));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.publish(LogMessage::error(text));
    }

    /// Takes every message currently queued, oldest first. Never blocks waiting
    /// for new messages.
    pub fn drain_all(&self) -> Vec<LogMessage> {
        let mut inbox = Vec::new();
        let rx = self.rx.lock().unwrap_or_else(|e| e.into_inner());
        while let Ok(message) = rx.try_recv() {
            inbox.push(message);
        }
        inbox
    }
}

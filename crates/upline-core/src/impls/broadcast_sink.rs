//! BroadcastEventSink - tokio broadcast で任意数の observer に配送

use tokio::sync::broadcast;

use crate::domain::UploadEvent;
use crate::ports::EventSink;

/// Fan-out sink. Slow subscribers lag and lose the oldest events; the control
/// line never waits for them.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    tx: broadcast::Sender<UploadEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: UploadEvent) {
        // ignore send error: no subscribers is fine
        let _ = self.tx.send(event);
    }
}

//! Job progress events.
//!
//! A job reports `start`, any number of `progress` events, and finally `done`
//! or `error`. Sinks decide where the events go: a broadcast channel for a
//! streaming bridge, or the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Name of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Progress,
    Error,
    Done,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Progress => "progress",
            EventKind::Error => "error",
            EventKind::Done => "done",
        }
    }

    /// Whether no further events follow for the task.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Error | EventKind::Done)
    }
}

/// One progress event for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub task_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            task_id: task_id.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Destination for progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Publishes events on a tokio broadcast channel.
pub struct BroadcastSink {
    sender: broadcast::Sender<ProgressEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl ProgressSink for BroadcastSink {
    fn emit(&self, event: ProgressEvent) {
        if self.sender.send(event).is_err() {
            debug!("No subscribers for progress event");
        }
    }
}

/// Writes events to the tracing log.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: ProgressEvent) {
        match event.kind {
            EventKind::Error => warn!(task_id = %event.task_id, "{}", event.message),
            kind => info!(task_id = %event.task_id, event = kind.as_str(), "{}", event.message),
        }
    }
}

/// Emits events for one task.
#[derive(Clone)]
pub struct TaskProgress {
    task_id: String,
    sink: Arc<dyn ProgressSink>,
}

impl TaskProgress {
    pub fn new(task_id: impl Into<String>, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            task_id: task_id.into(),
            sink,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    fn emit(&self, kind: EventKind, message: impl Into<String>) {
        self.sink
            .emit(ProgressEvent::new(kind, self.task_id.clone(), message));
    }

    pub fn start(&self, message: impl Into<String>) {
        self.emit(EventKind::Start, message);
    }

    pub fn progress(&self, message: impl Into<String>) {
        self.emit(EventKind::Progress, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(EventKind::Error, message);
    }

    pub fn done(&self, message: impl Into<String>) {
        self.emit(EventKind::Done, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = ProgressEvent::new(EventKind::Progress, "task-1", "Segmentation done");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "progress");
        assert_eq!(json["taskId"], "task-1");
        assert_eq!(json["message"], "Segmentation done");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_broadcast_sink_delivers_in_order() {
        let sink = Arc::new(BroadcastSink::new(16));
        let mut rx = sink.subscribe();
        let progress = TaskProgress::new("t", sink.clone());

        progress.start("started");
        progress.progress("halfway");
        progress.done("finished");

        let kinds: Vec<EventKind> = vec![
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
        ];
        assert_eq!(kinds, vec![EventKind::Start, EventKind::Progress, EventKind::Done]);
        assert!(kinds[2].is_terminal());
    }

    #[test]
    fn test_emit_without_subscribers() {
        let sink = BroadcastSink::new(4);
        sink.emit(ProgressEvent::new(EventKind::Start, "t", "nobody listening"));
        LogSink.emit(ProgressEvent::new(EventKind::Error, "t", "logged"));
    }
}

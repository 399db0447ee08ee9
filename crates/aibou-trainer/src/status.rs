//! Status streaming for training runs.
//!
//! The orchestrator reports progress through a [`StatusSink`]; callers
//! decide where the strings go: the log stream for the CLI, memory for
//! the web status panel, a capture buffer in tests.

use std::sync::Mutex;

/// A single progress notification.
#[derive(Debug, Clone)]
pub enum StatusEvent {
    /// A human-readable phase message.
    Message(String),
    /// Periodic training progress.
    Step {
        epoch: usize,
        step: usize,
        total_steps: usize,
        loss: f64,
    },
}

impl StatusEvent {
    /// Human-readable form, what a status panel displays.
    pub fn render(&self) -> String {
        match self {
            Self::Message(msg) => msg.clone(),
            Self::Step {
                epoch,
                step,
                total_steps,
                loss,
            } => format!("epoch {epoch}: step {step}/{total_steps}, loss {loss:.4}"),
        }
    }
}

/// Where status events are delivered.
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: StatusEvent);
}

/// Forwards every event to the `tracing` log stream.
#[derive(Debug, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn emit(&self, event: StatusEvent) {
        tracing::info!("{}", event.render());
    }
}

/// Collects rendered messages in memory.
///
/// Drives the web status panel and test assertions. Consumers read the
/// whole history; the newest entry is what a one-line panel shows.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message emitted so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// The most recently emitted message, if any.
    pub fn last(&self) -> Option<String> {
        self.messages
            .lock()
            .ok()
            .and_then(|m| m.last().cloned())
    }
}

impl StatusSink for MemorySink {
    fn emit(&self, event: StatusEvent) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(event.render());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_preserves_order() {
        let sink = MemorySink::new();
        sink.emit(StatusEvent::Message("first".into()));
        sink.emit(StatusEvent::Message("second".into()));

        assert_eq!(sink.messages(), vec!["first", "second"]);
        assert_eq!(sink.last().as_deref(), Some("second"));
    }

    #[test]
    fn step_events_render_loss() {
        let event = StatusEvent::Step {
            epoch: 2,
            step: 30,
            total_steps: 80,
            loss: 1.25,
        };
        let rendered = event.render();
        assert!(rendered.contains("epoch 2"));
        assert!(rendered.contains("30/80"));
        assert!(rendered.contains("1.2500"));
    }

    #[test]
    fn sinks_are_object_safe() {
        fn takes_sink(_sink: &dyn StatusSink) {}
        takes_sink(&LogSink);
        takes_sink(&MemorySink::new());
    }
}

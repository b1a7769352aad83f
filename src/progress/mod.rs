//! Progress reporting for install requests
//!
//! Two narrow capabilities are handed to every request:
//! - [`ProgressSink`] receives the ordered task narrative (`Begin`, `Message`,
//!   `Complete` events)
//! - [`DownloadSink`] receives byte-level download updates
//!
//! Both are fire-and-forget. A request talks to its task sink only through a
//! [`TaskReporter`], whose `complete` consumes the reporter so at most one
//! terminal event can ever be emitted per request.

pub mod terminal;

use std::sync::{Mutex, PoisonError};

pub use terminal::TerminalProgress;

/// Kind of a task progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Begin,
    Message,
    Complete,
}

/// One step of a request's progress narrative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub name: String,
    pub message: String,
    pub completed: bool,
}

impl ProgressEvent {
    pub fn begin(name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Begin,
            name: name.into(),
            message: String::new(),
            completed: false,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Message,
            name: String::new(),
            message: message.into(),
            completed: false,
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Complete,
            name: String::new(),
            message: message.into(),
            completed: true,
        }
    }
}

/// Receiver of task progress events. Must not block for long.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: ProgressEvent) {
        self(event);
    }
}

/// Byte-level download update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProgress {
    pub url: String,
    pub downloaded: u64,
    pub total: Option<u64>,
    pub completed: bool,
}

/// Receiver of download progress. Opaque to the orchestrator.
pub trait DownloadSink: Send + Sync {
    fn on_progress(&self, update: DownloadProgress);
}

impl<F> DownloadSink for F
where
    F: Fn(DownloadProgress) + Send + Sync,
{
    fn on_progress(&self, update: DownloadProgress) {
        self(update);
    }
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}

impl DownloadSink for NoProgress {
    fn on_progress(&self, _update: DownloadProgress) {}
}

/// Sink that records every event in order
#[derive(Debug, Default)]
pub struct ProgressLog {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of events with `completed = true`
    pub fn completed_count(&self) -> usize {
        self.events().iter().filter(|e| e.completed).count()
    }
}

impl ProgressSink for ProgressLog {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Per-request handle on a [`ProgressSink`]
pub struct TaskReporter<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> TaskReporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink }
    }

    pub fn begin(&self, name: impl Into<String>) {
        self.sink.on_event(ProgressEvent::begin(name));
    }

    pub fn message(&self, message: impl Into<String>) {
        self.sink.on_event(ProgressEvent::message(message));
    }

    /// Emit the terminal event. Consumes the reporter.
    pub fn complete(self, message: impl Into<String>) {
        self.sink.on_event(ProgressEvent::complete(message));
    }
}

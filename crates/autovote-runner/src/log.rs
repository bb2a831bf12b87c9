//! Run progress messages: the sink the runner writes to and a broadcast
//! fan-out for live observers.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast;

/// Receives the human-readable progress messages of a run.
///
/// Emitting must not block or fail the run. Any `Fn(&str)` closure is a sink.
pub trait LogSink: Send + Sync {
    fn emit(&self, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, message: &str) {
        self(message)
    }
}

/// A timestamped message, optionally tagged with the run it belongs to.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub run: Option<String>,
    pub message: String,
}

impl LogLine {
    pub fn now(run: Option<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            run,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Wire shape of a line sent to dashboard observers.
#[derive(Debug, Serialize)]
pub struct LogPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
}

impl From<&LogLine> for LogPayload {
    fn from(line: &LogLine) -> Self {
        Self {
            message: line.to_string(),
            run: line.run.clone(),
        }
    }
}

/// Process-wide fan-out of log lines to any number of subscribers.
///
/// Sending never blocks. Subscribers that fall behind lose the oldest lines.
#[derive(Debug, Clone)]
pub struct LogBroadcast {
    tx: broadcast::Sender<LogLine>,
}

impl Default for LogBroadcast {
    fn default() -> Self {
        Self::new(256)
    }
}

impl LogBroadcast {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Start receiving lines sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LogLine> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn observers(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Send an untagged line.
    pub fn send(&self, message: impl Into<String>) {
        // No subscribers is fine.
        let _ = self.tx.send(LogLine::now(None, message));
    }

    /// A sink that tags each line with `run`.
    pub fn scoped(&self, run: impl Into<String>) -> ScopedLog {
        ScopedLog {
            run: run.into(),
            tx: self.tx.clone(),
        }
    }
}

impl LogSink for LogBroadcast {
    fn emit(&self, message: &str) {
        self.send(message);
    }
}

/// Broadcast sink bound to one run.
#[derive(Debug, Clone)]
pub struct ScopedLog {
    run: String,
    tx: broadcast::Sender<LogLine>,
}

impl ScopedLog {
    pub fn run(&self) -> &str {
        &self.run
    }
}

impl LogSink for ScopedLog {
    fn emit(&self, message: &str) {
        let _ = self.tx.send(LogLine::now(Some(self.run.clone()), message));
    }
}

// crates/fcs-core/src/events.rs
// ============================================================================
// Module: Pipeline Events
// Description: Structured JSON-lines events emitted by the pipeline.
// Purpose: Surface warnings and milestones without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Pipeline stages report noteworthy conditions (unresolved context tokens,
//! skipped conditional properties, insecure transports, plan sizes) as
//! [`PipelineEvent`]s through an [`EventSink`]. Sinks serialize events as one
//! JSON object per line. Events never affect control flow.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Informational milestone.
    Info,
    /// Recoverable condition worth operator attention.
    Warn,
    /// Failure that ended a unit of work.
    Error,
}

/// Pipeline event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Subject of the event (test-case ID, specification name, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl PipelineEvent {
    /// Creates an event with a consistent timestamp.
    #[must_use]
    pub fn new(
        event: &'static str,
        level: EventLevel,
        subject: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            level,
            subject,
            message: message.into(),
        }
    }

    /// Creates an informational event about `subject`.
    #[must_use]
    pub fn info(event: &'static str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Info, Some(subject.into()), message)
    }

    /// Creates a warning event about `subject`.
    #[must_use]
    pub fn warn(event: &'static str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Warn, Some(subject.into()), message)
    }

    /// Creates an error event about `subject`.
    #[must_use]
    pub fn error(event: &'static str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Error, Some(subject.into()), message)
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for pipeline events.
pub trait EventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &PipelineEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record(&self, event: &PipelineEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for FileEventSink {
    fn record(&self, event: &PipelineEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &PipelineEvent) {}
}

/// Event sink that keeps events in memory.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the recorded events with the given identifier.
    #[must_use]
    pub fn named(&self, event: &str) -> Vec<PipelineEvent> {
        self.events().into_iter().filter(|recorded| recorded.event == event).collect()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use std::io::Read;

    use super::*;

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let sink = FileEventSink::new(&path).unwrap();
        sink.record(&PipelineEvent::warn("context_value_missing", "OB-01", "missing $accountId"));
        sink.record(&PipelineEvent::info("test_plan_compiled", "Account and Transaction API", "3 test cases"));
        let mut text = String::new();
        std::fs::File::open(&path).unwrap().read_to_string(&mut text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "context_value_missing");
        assert_eq!(first["level"], "warn");
        assert_eq!(first["subject"], "OB-01");
    }

    #[test]
    fn memory_sink_filters_by_name() {
        let sink = MemoryEventSink::new();
        sink.record(&PipelineEvent::warn("insecure_connection", "http", "tls verification disabled"));
        sink.record(&PipelineEvent::info("result_stream_closed", "stream", "eof"));
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.named("insecure_connection").len(), 1);
    }
}

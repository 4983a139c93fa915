//! In-memory capture of recent extension logs.
//!
//! [`LogCaptureLayer`] keeps the last [`MAX_ENTRIES`] events emitted under a
//! `tonepro` target so the settings popup can hand them out as a diagnostics
//! dump. Each JS context (page, worker, popup) has its own buffer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

pub const MAX_ENTRIES: usize = 100;

/// Least severe level that is kept.
const CAPTURE_LEVEL: Level = Level::DEBUG;

thread_local! {
    static ENTRIES: RefCell<VecDeque<LogEntry>> = RefCell::new(VecDeque::with_capacity(MAX_ENTRIES));
}

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.target, self.message)?;
        for (name, value) in &self.fields {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

fn is_captured(target: &str) -> bool {
    target.starts_with("tonepro")
}

pub struct LogCaptureLayer;

impl<S: Subscriber> Layer<S> for LogCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > CAPTURE_LEVEL || !is_captured(metadata.target()) {
            return;
        }
        let mut entry = LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut EntryVisitor(&mut entry));
        record(entry);
    }
}

struct EntryVisitor<'a>(&'a mut LogEntry);

impl EntryVisitor<'_> {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.0.message = value;
        } else {
            self.0.fields.push((field.name(), value));
        }
    }
}

impl Visit for EntryVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }
}

fn record(entry: LogEntry) {
    ENTRIES.with(|entries| {
        let mut entries = entries.borrow_mut();
        while entries.len() >= MAX_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    });
}

/// Captured entries, oldest first.
pub fn recent() -> Vec<LogEntry> {
    ENTRIES.with(|entries| entries.borrow().iter().cloned().collect())
}

/// Captured entries rendered one per line.
pub fn get_logs() -> String {
    ENTRIES.with(|entries| {
        entries
            .borrow()
            .iter()
            .map(LogEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub fn clear_logs() {
    ENTRIES.with(|entries| entries.borrow_mut().clear());
}

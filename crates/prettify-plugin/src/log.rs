//! Error log
//!
//! Keeps the most recent formatting failures, newest first, with clickable
//! source locations parsed out of the engine's message.

use std::collections::VecDeque;
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use prettify_core::{FileId, Position};
use regex::Regex;

use crate::host::Notifier;

/// Maximum number of entries kept
pub const MAX_LOG_ENTRIES: usize = 10;

/// Toast shown when the side button can open the log
pub const SIDE_BUTTON_HINT: &str =
    "Error occurred while formatting code. Click on the side button to view logs.";

/// Toast shown when only the command palette can open the log
pub const COMMAND_PALETTE_HINT: &str =
    "Error occurred while formatting code. Search for 'prettier logs' in the command palette to view logs.";

/// A `line:column` location as printed by the engine (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    /// Parse the first `line:column` pair in an error message
    pub fn parse(text: &str) -> Option<Self> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let re = PATTERN.get_or_init(|| Regex::new(r"(\d+):(\d+)").ok()).as_ref()?;
        let caps = re.captures(text)?;
        let line = caps.get(1)?.as_str().parse().ok()?;
        let column = caps.get(2)?.as_str().parse().ok()?;
        Some(Self { line, column })
    }

    /// The zero-based editor position
    pub fn to_position(self) -> Position {
        Position::new(self.line.saturating_sub(1), self.column.saturating_sub(1))
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// The engine rejected the source
    Format,
    /// The project config could not be read
    Config,
    /// The worker never answered
    Timeout,
}

impl LogKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Format => "Format error",
            Self::Config => "Config error",
            Self::Timeout => "Timeout",
        }
    }
}

/// One recorded failure
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub file_id: FileId,
    pub file_name: String,
    pub kind: LogKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn new(file_id: FileId, file_name: impl Into<String>, kind: LogKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            location: SourceLocation::parse(&message),
            file_id,
            file_name: file_name.into(),
            kind,
            message,
            timestamp: Local::now(),
        }
    }

    /// Where clicking the entry moves the cursor
    pub fn jump_target(&self) -> Option<Position> {
        self.location.map(SourceLocation::to_position)
    }

    /// Text card for display: message, file and location, timestamp
    pub fn render(&self) -> String {
        let origin = match self.location {
            Some(location) => format!("{} ({})", self.file_name, location),
            None => self.file_name.clone(),
        };
        format!(
            "[{}] {}\n{}  {}",
            self.kind.label(),
            self.message,
            origin,
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Bounded, newest-first list of failures
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: VecDeque<LogEntry>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry, evicting the oldest past [`MAX_LOG_ENTRIES`]
    pub fn record(&mut self, entry: LogEntry) -> &LogEntry {
        tracing::debug!(file = %entry.file_id, kind = ?entry.kind, "recording format failure");
        self.entries.push_front(entry);
        self.entries.truncate(MAX_LOG_ENTRIES);
        &self.entries[0]
    }

    /// Remove every entry for `file_id`; returns how many were removed
    pub fn clear(&mut self, file_id: &FileId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.file_id != file_id);
        before - self.entries.len()
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the side button should be visible
    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn has_errors_for(&self, file_id: &FileId) -> bool {
        self.entries.iter().any(|entry| &entry.file_id == file_id)
    }

    /// File and position targeted by clicking entry `index`
    pub fn jump_target(&self, index: usize) -> Option<(FileId, Position)> {
        let entry = self.entries.get(index)?;
        Some((entry.file_id.clone(), entry.jump_target()?))
    }
}

/// Tell the user about a new failure
pub fn surface(notifier: &mut dyn Notifier, open_log_on_error: bool) {
    notifier.set_side_button_visible(true);
    if open_log_on_error {
        notifier.show_log();
    } else if notifier.side_buttons_enabled() {
        notifier.toast(SIDE_BUTTON_HINT);
    } else {
        notifier.toast(COMMAND_PALETTE_HINT);
    }
}

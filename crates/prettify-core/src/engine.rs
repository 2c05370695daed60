//! The formatting engine seam
//!
//! Parsing and printing source code is Prettier's job. This module defines
//! what a format call looks like from the integration's side.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::CursorOptions;

/// A single format call
#[derive(Debug, Clone, PartialEq)]
pub struct FormatRequest {
    /// Source text to format
    pub code: String,
    /// Engine options, including parser and file path
    pub options: CursorOptions,
    /// Selection jobs format a standalone snippet without cursor tracking
    pub is_selection: bool,
}

impl FormatRequest {
    pub fn new(code: impl Into<String>, options: CursorOptions) -> Self {
        Self {
            code: code.into(),
            options,
            is_selection: false,
        }
    }

    pub fn selection(code: impl Into<String>, options: CursorOptions) -> Self {
        Self {
            code: code.into(),
            options,
            is_selection: true,
        }
    }
}

/// Engine output: `formatWithCursor` returns text plus the moved cursor,
/// plain `format` returns only text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatResult {
    WithCursor {
        formatted: String,
        #[serde(rename = "cursorOffset")]
        cursor_offset: usize,
    },
    Plain(String),
}

impl FormatResult {
    /// The formatted text
    pub fn formatted(&self) -> &str {
        match self {
            Self::WithCursor { formatted, .. } | Self::Plain(formatted) => formatted,
        }
    }

    /// The cursor offset reported by the engine, if it tracked one
    pub fn cursor_offset(&self) -> Option<usize> {
        match self {
            Self::WithCursor { cursor_offset, .. } => Some(*cursor_offset),
            Self::Plain(_) => None,
        }
    }

    pub fn into_formatted(self) -> String {
        match self {
            Self::WithCursor { formatted, .. } | Self::Plain(formatted) => formatted,
        }
    }
}

/// Errors produced while formatting
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine rejected the input (syntax error, unknown parser, ...)
    #[error("{message}")]
    Format { message: String },

    #[error("failed to start formatter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("formatter I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid formatter response: {0}")]
    Protocol(String),
}

impl EngineError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }
}

/// Serializable error carried back from a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            name: None,
        }
    }
}

impl From<&EngineError> for ErrorInfo {
    fn from(error: &EngineError) -> Self {
        let name = match error {
            EngineError::Format { .. } => "FormatError",
            EngineError::Spawn { .. } => "SpawnError",
            EngineError::Io(_) => "IoError",
            EngineError::Protocol(_) => "ProtocolError",
        };
        Self {
            message: error.to_string(),
            name: Some(name.to_string()),
        }
    }
}

/// A formatting engine
///
/// Implementations must be callable from the worker thread.
pub trait Formatter: Send + Sync {
    fn format(&self, request: &FormatRequest) -> Result<FormatResult, EngineError>;
}

impl<F> Formatter for F
where
    F: Fn(&FormatRequest) -> Result<FormatResult, EngineError> + Send + Sync,
{
    fn format(&self, request: &FormatRequest) -> Result<FormatResult, EngineError> {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_with_cursor_from_json() {
        let result: FormatResult =
            serde_json::from_value(json!({ "formatted": "a;\n", "cursorOffset": 1 })).unwrap();
        assert_eq!(result.formatted(), "a;\n");
        assert_eq!(result.cursor_offset(), Some(1));
    }

    #[test]
    fn result_plain_from_json() {
        let result: FormatResult = serde_json::from_value(json!("a;\n")).unwrap();
        assert_eq!(result, FormatResult::Plain("a;\n".into()));
        assert_eq!(result.cursor_offset(), None);
    }

    #[test]
    fn error_info_keeps_engine_message() {
        let error = EngineError::format("Unexpected token (1:7)");
        let info = ErrorInfo::from(&error);
        assert_eq!(info.message, "Unexpected token (1:7)");
        assert_eq!(info.name.as_deref(), Some("FormatError"));
    }

    #[test]
    fn closures_are_formatters() {
        let upper = |request: &FormatRequest| -> Result<FormatResult, EngineError> {
            Ok(FormatResult::Plain(request.code.to_uppercase()))
        };
        let options = CursorOptions::new("babel".into(), "a.js".into(), Default::default());
        let result = upper.format(&FormatRequest::new("abc", options)).unwrap();
        assert_eq!(result.formatted(), "ABC");
    }
}

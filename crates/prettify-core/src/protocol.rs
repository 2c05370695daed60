//! Messages exchanged with a background format worker
//!
//! The wire form is camelCase JSON so the same messages can cross a process
//! or web-worker boundary.

use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, ErrorInfo, FormatRequest, FormatResult};
use crate::options::CursorOptions;
use crate::position::SelectionSpan;

/// Action tag carried by every format response
pub const FORMAT_ACTION: &str = "code format";

/// Editor-assigned file identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Correlation key for a request and its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Request sent to the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub id: RequestId,
    pub file_id: FileId,
    pub code: String,
    pub cursor_options: CursorOptions,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_selection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_range: Option<SelectionSpan>,
}

impl WorkerRequest {
    /// Split into the engine call and the envelope needed to answer it
    pub fn into_parts(self) -> (FormatRequest, ResponseEnvelope) {
        let envelope = ResponseEnvelope {
            id: self.id,
            file_id: self.file_id,
            is_selection: self.is_selection,
            selection_range: self.selection_range,
        };
        let request = FormatRequest {
            code: self.code,
            options: self.cursor_options,
            is_selection: self.is_selection,
        };
        (request, envelope)
    }
}

/// The parts of a request echoed back in its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub id: RequestId,
    pub file_id: FileId,
    pub is_selection: bool,
    pub selection_range: Option<SelectionSpan>,
}

impl ResponseEnvelope {
    /// Build the response for an engine outcome
    pub fn respond(self, outcome: Result<FormatResult, EngineError>) -> WorkerResponse {
        let (res, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(error) => (None, Some(ErrorInfo::from(&error))),
        };
        WorkerResponse {
            id: self.id,
            file_id: self.file_id,
            action: FORMAT_ACTION.to_string(),
            res,
            error,
            is_selection: self.is_selection,
            selection_range: self.selection_range,
        }
    }
}

/// Response sent back by the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponse {
    pub id: RequestId,
    pub file_id: FileId,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res: Option<FormatResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_selection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_range: Option<SelectionSpan>,
}

impl WorkerResponse {
    /// The engine outcome; a response with neither result nor error is a
    /// protocol error
    pub fn outcome(&self) -> Result<&FormatResult, ErrorInfo> {
        match (&self.res, &self.error) {
            (_, Some(error)) => Err(error.clone()),
            (Some(result), None) => Ok(result),
            (None, None) => Err(ErrorInfo::new("formatter returned neither a result nor an error")),
        }
    }
}

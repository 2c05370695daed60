//! Background format worker
//!
//! A single dedicated thread runs the formatter so the editor thread never
//! blocks on it. Requests and responses travel over unbounded tokio channels;
//! the worker side uses `blocking_recv` and the editor side polls or awaits.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use prettify_core::{EngineError, Formatter, WorkerRequest, WorkerResponse};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors talking to the worker
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to start format worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("format worker is no longer running")]
    ChannelClosed,
}

/// Handle to the worker thread
#[derive(Debug)]
pub struct FormatWorker {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    responses: mpsc::UnboundedReceiver<WorkerResponse>,
    handle: Option<JoinHandle<()>>,
}

impl FormatWorker {
    /// Start the worker thread
    pub fn spawn(formatter: Arc<dyn Formatter>) -> Result<Self, WorkerError> {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<WorkerRequest>();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        let handle = thread::Builder::new()
            .name("prettify-worker".to_string())
            .spawn(move || {
                while let Some(request) = request_rx.blocking_recv() {
                    let (format_request, envelope) = request.into_parts();
                    let outcome = catch_unwind(AssertUnwindSafe(|| formatter.format(&format_request)))
                        .unwrap_or_else(|_| Err(EngineError::Protocol("formatter panicked".to_string())));
                    if response_tx.send(envelope.respond(outcome)).is_err() {
                        break;
                    }
                }
                tracing::debug!("format worker stopped");
            })
            .map_err(WorkerError::Spawn)?;

        Ok(Self {
            requests: request_tx,
            responses: response_rx,
            handle: Some(handle),
        })
    }

    /// Queue a request
    pub fn send(&self, request: WorkerRequest) -> Result<(), WorkerError> {
        self.requests.send(request).map_err(|_| WorkerError::ChannelClosed)
    }

    /// Take a finished response without waiting
    pub fn try_recv(&mut self) -> Option<WorkerResponse> {
        self.responses.try_recv().ok()
    }

    /// Wait for the next response; `None` once the worker has stopped
    pub async fn recv(&mut self) -> Option<WorkerResponse> {
        self.responses.recv().await
    }

    /// Stop accepting requests and wait for the thread to finish its
    /// current job
    pub fn shutdown(self) {
        let Self { requests, handle, .. } = self;
        drop(requests);
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!("format worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prettify_core::{CursorOptions, FileId, FormatOptions, FormatRequest, FormatResult, RequestId};

    fn request(id: u64, code: &str) -> WorkerRequest {
        WorkerRequest {
            id: RequestId(id),
            file_id: FileId::new("f"),
            code: code.to_string(),
            cursor_options: CursorOptions::new("babel".into(), "a.js".into(), FormatOptions::default()),
            is_selection: false,
            selection_range: None,
        }
    }

    fn echo() -> Arc<dyn Formatter> {
        Arc::new(|request: &FormatRequest| -> Result<FormatResult, EngineError> {
            if request.code == "panic" {
                panic!("engine crashed");
            }
            Ok(FormatResult::Plain(format!("{}\n", request.code)))
        })
    }

    #[tokio::test]
    async fn test_round_trip() {
        let mut worker = FormatWorker::spawn(echo()).unwrap();
        worker.send(request(1, "a")).unwrap();
        worker.send(request(2, "b")).unwrap();

        let first = worker.recv().await.unwrap();
        let second = worker.recv().await.unwrap();
        assert_eq!(first.id, RequestId(1));
        assert_eq!(first.outcome().unwrap().formatted(), "a\n");
        assert_eq!(second.id, RequestId(2));

        worker.shutdown();
    }

    #[tokio::test]
    async fn test_panicking_formatter_reports_error() {
        let mut worker = FormatWorker::spawn(echo()).unwrap();
        worker.send(request(1, "panic")).unwrap();
        worker.send(request(2, "ok")).unwrap();

        let failed = worker.recv().await.unwrap();
        assert!(failed.outcome().is_err());
        let next = worker.recv().await.unwrap();
        assert_eq!(next.outcome().unwrap().formatted(), "ok\n");

        worker.shutdown();
    }
}

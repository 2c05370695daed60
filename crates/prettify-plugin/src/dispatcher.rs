//! Format dispatch
//!
//! Builds format requests from the editor state, sends them to the worker
//! (or calls the formatter in-process when no worker is available) and
//! applies the results back to the editor.
//!
//! Requests are correlated by a monotonically increasing [`RequestId`].
//! A response is applied only while its id is still pending; late,
//! duplicate and expired responses are dropped, as are responses for files
//! that have since been closed.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use prettify_core::{
    document_span, expand_selection, infer_parser, offset_to_position, position_to_offset, resolve_config,
    ConfigError, CursorOptions, ErrorInfo, FileId, FormatOptions, FormatRequest, FormatResult, Formatter,
    RequestId, SelectionSpan, WorkerRequest, WorkerResponse,
};

use crate::host::{EditorHost, Notifier};
use crate::log::{self, ErrorLog, LogEntry, LogKind};
use crate::settings::SettingsHandle;
use crate::worker::FormatWorker;

/// How long a request may stay unanswered before it is reported
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where format calls run
enum DispatchMode {
    Background(FormatWorker),
    Inline(Arc<dyn Formatter>),
}

impl std::fmt::Debug for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Background(worker) => f.debug_tuple("Background").field(worker).finish(),
            Self::Inline(_) => f.write_str("Inline"),
        }
    }
}

/// What happened to a format request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sent to the worker; the result arrives through `poll`
    Queued(RequestId),
    /// The result was applied to the document
    Applied,
    /// The failure was recorded in the error log
    Failed,
    /// Nothing to do: no such file, or the response was stale
    Dropped,
}

#[derive(Debug, Clone)]
struct PendingRequest {
    file_id: FileId,
    file_name: String,
    selection_range: Option<SelectionSpan>,
    issued_at: Instant,
}

/// A request ready to be dispatched
struct Job {
    file_id: FileId,
    file_name: String,
    code: String,
    options: CursorOptions,
    selection_range: Option<SelectionSpan>,
}

/// Sends format jobs and applies their results
#[derive(Debug)]
pub struct FormatDispatcher {
    mode: DispatchMode,
    settings: SettingsHandle,
    log: ErrorLog,
    pending: HashMap<RequestId, PendingRequest>,
    next_id: u64,
    timeout: Duration,
}

impl FormatDispatcher {
    /// Dispatch through a background worker, falling back to in-process
    /// formatting if the worker thread cannot be started
    pub fn new(settings: SettingsHandle, formatter: Arc<dyn Formatter>) -> Self {
        let mode = match FormatWorker::spawn(Arc::clone(&formatter)) {
            Ok(worker) => DispatchMode::Background(worker),
            Err(e) => {
                tracing::warn!("{}; formatting in-process", e);
                DispatchMode::Inline(formatter)
            }
        };
        Self::with_mode(settings, mode)
    }

    /// Always format in-process
    pub fn inline(settings: SettingsHandle, formatter: Arc<dyn Formatter>) -> Self {
        Self::with_mode(settings, DispatchMode::Inline(formatter))
    }

    fn with_mode(settings: SettingsHandle, mode: DispatchMode) -> Self {
        Self {
            mode,
            settings,
            log: ErrorLog::new(),
            pending: HashMap::new(),
            next_id: 0,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_background(&self) -> bool {
        matches!(self.mode, DispatchMode::Background(_))
    }

    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ErrorLog {
        &mut self.log
    }

    /// Number of requests awaiting a response
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Format the whole document, tracking the cursor
    pub async fn format_document<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier, file: &FileId) -> DispatchOutcome
    where
        H: EditorHost + ?Sized,
    {
        let (Some(code), Some(file_name)) = (host.text(file), host.file_name(file)) else {
            return DispatchOutcome::Dropped;
        };
        let cursor = host.cursor(file).unwrap_or_default();

        let options = match self.options_for(&*host, file).await {
            Ok(options) => options,
            Err(e) => return self.config_failed(notifier, file, &file_name, &e),
        };
        let options = CursorOptions::new(infer_parser(&file_name), file_name.clone(), options)
            .with_cursor_offset(position_to_offset(&code, cursor));

        self.dispatch(
            host,
            notifier,
            Job {
                file_id: file.clone(),
                file_name,
                code,
                options,
                selection_range: None,
            },
        )
    }

    /// Format the selected lines in isolation, or the whole document when
    /// nothing is selected
    pub async fn format_selection<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier, file: &FileId) -> DispatchOutcome
    where
        H: EditorHost + ?Sized,
    {
        let (Some(text), Some(file_name)) = (host.text(file), host.file_name(file)) else {
            return DispatchOutcome::Dropped;
        };
        let selection = host.selection(file).unwrap_or_default();
        let Some((span, code)) = expand_selection(&text, selection) else {
            return self.format_document(host, notifier, file).await;
        };

        let options = match self.options_for(&*host, file).await {
            Ok(options) => options.for_selection(),
            Err(e) => return self.config_failed(notifier, file, &file_name, &e),
        };
        let options = CursorOptions::new(infer_parser(&file_name), file_name.clone(), options);

        self.dispatch(
            host,
            notifier,
            Job {
                file_id: file.clone(),
                file_name,
                code,
                options,
                selection_range: Some(span),
            },
        )
    }

    /// Project config if one exists, otherwise the user's defaults
    async fn options_for<H>(&self, host: &H, file: &FileId) -> Result<FormatOptions, ConfigError>
    where
        H: EditorHost + ?Sized,
    {
        let defaults = || self.settings.snapshot().options;
        let Some(path) = host.file_path(file) else {
            return Ok(defaults());
        };
        let folders: Vec<PathBuf> = host.project_folders();
        Ok(match resolve_config(&path, &folders).await? {
            Some(resolved) => resolved.options,
            None => defaults(),
        })
    }

    fn config_failed(
        &mut self,
        notifier: &mut dyn Notifier,
        file: &FileId,
        file_name: &str,
        error: &ConfigError,
    ) -> DispatchOutcome {
        tracing::warn!("{}", error);
        self.fail(notifier, LogEntry::new(file.clone(), file_name, LogKind::Config, error.to_string()))
    }

    fn fail(&mut self, notifier: &mut dyn Notifier, entry: LogEntry) -> DispatchOutcome {
        self.log.record(entry);
        log::surface(notifier, self.settings.snapshot().open_error_page_on_errors);
        DispatchOutcome::Failed
    }

    fn dispatch<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier, job: Job) -> DispatchOutcome
    where
        H: EditorHost + ?Sized,
    {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        tracing::debug!(request = %id, file = %job.file_id, parser = %job.options.parser, "dispatching format");

        let formatter = match &self.mode {
            DispatchMode::Inline(formatter) => Arc::clone(formatter),
            DispatchMode::Background(worker) => {
                let request = WorkerRequest {
                    id,
                    file_id: job.file_id.clone(),
                    code: job.code,
                    cursor_options: job.options,
                    is_selection: job.selection_range.is_some(),
                    selection_range: job.selection_range,
                };
                return match worker.send(request) {
                    Ok(()) => {
                        self.pending.insert(
                            id,
                            PendingRequest {
                                file_id: job.file_id,
                                file_name: job.file_name,
                                selection_range: job.selection_range,
                                issued_at: Instant::now(),
                            },
                        );
                        DispatchOutcome::Queued(id)
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        self.fail(notifier, LogEntry::new(job.file_id, job.file_name, LogKind::Format, e.to_string()))
                    }
                };
            }
        };

        let request = FormatRequest {
            code: job.code,
            options: job.options,
            is_selection: job.selection_range.is_some(),
        };
        let outcome = formatter.format(&request).map_err(|e| ErrorInfo::from(&e));
        self.apply(host, notifier, &job.file_id, &job.file_name, job.selection_range, outcome)
    }

    /// Apply a result to the document, or record the failure
    fn apply<H>(
        &mut self,
        host: &mut H,
        notifier: &mut dyn Notifier,
        file: &FileId,
        file_name: &str,
        selection_range: Option<SelectionSpan>,
        outcome: Result<FormatResult, ErrorInfo>,
    ) -> DispatchOutcome
    where
        H: EditorHost + ?Sized,
    {
        let result = match outcome {
            Ok(result) => result,
            Err(error) => {
                return self.fail(notifier, LogEntry::new(file.clone(), file_name, LogKind::Format, error.message));
            }
        };

        if let Some(span) = selection_range {
            let formatted = result.formatted();
            let formatted = formatted.strip_suffix('\n').unwrap_or(formatted);
            if !host.replace(file, span, formatted) {
                return DispatchOutcome::Dropped;
            }
            host.clear_selection(file);
        } else {
            let Some(current) = host.text(file) else {
                return DispatchOutcome::Dropped;
            };
            if !host.replace(file, document_span(&current), result.formatted()) {
                return DispatchOutcome::Dropped;
            }
            if let Some(offset) = result.cursor_offset() {
                host.move_cursor(file, offset_to_position(result.formatted(), offset));
            }
        }

        self.clear_errors(notifier, file);
        DispatchOutcome::Applied
    }

    /// Drop every log entry for `file`, hiding the side button once the log
    /// is empty
    pub fn clear_errors(&mut self, notifier: &mut dyn Notifier, file: &FileId) {
        if self.log.clear(file) > 0 && !self.log.has_errors() {
            notifier.set_side_button_visible(false);
        }
    }

    /// Apply one worker response
    pub fn handle_response<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier, response: WorkerResponse) -> DispatchOutcome
    where
        H: EditorHost + ?Sized,
    {
        let Some(pending) = self.pending.remove(&response.id) else {
            tracing::warn!(request = %response.id, "dropping response for unknown or expired request");
            return DispatchOutcome::Dropped;
        };
        if pending.file_id != response.file_id {
            tracing::warn!(request = %response.id, "dropping response for mismatched file {}", response.file_id);
            return DispatchOutcome::Dropped;
        }
        if !host.contains(&pending.file_id) {
            tracing::debug!(request = %response.id, "file {} closed before formatting finished", pending.file_id);
            return DispatchOutcome::Dropped;
        }

        let outcome = response.outcome().cloned();
        self.apply(
            host,
            notifier,
            &pending.file_id,
            &pending.file_name,
            pending.selection_range,
            outcome,
        )
    }

    /// Apply every finished response and expire stale requests; returns the
    /// number of responses handled
    pub fn poll<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier) -> usize
    where
        H: EditorHost + ?Sized,
    {
        let mut handled = 0;
        loop {
            let DispatchMode::Background(worker) = &mut self.mode else {
                break;
            };
            let Some(response) = worker.try_recv() else {
                break;
            };
            self.handle_response(host, notifier, response);
            handled += 1;
        }
        self.expire_stale(notifier, Instant::now());
        handled
    }

    /// Report requests older than the timeout; returns how many expired
    pub fn expire_stale(&mut self, notifier: &mut dyn Notifier, now: Instant) -> usize {
        let timeout = self.timeout;
        let expired: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|(_, pending)| now.saturating_duration_since(pending.issued_at) >= timeout)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(pending) = self.pending.remove(id) {
                tracing::warn!(request = %id, "format request timed out");
                self.log.record(LogEntry::new(
                    pending.file_id,
                    pending.file_name,
                    LogKind::Timeout,
                    format!("Formatter did not respond within {} seconds.", timeout.as_secs_f32()),
                ));
            }
        }
        if !expired.is_empty() {
            log::surface(notifier, self.settings.snapshot().open_error_page_on_errors);
        }
        expired.len()
    }

    /// Wait up to `wait` for one response and apply it
    pub async fn next_response<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier, wait: Duration) -> Option<DispatchOutcome>
    where
        H: EditorHost + ?Sized,
    {
        let DispatchMode::Background(worker) = &mut self.mode else {
            return None;
        };
        let response = tokio::time::timeout(wait, worker.recv()).await.ok()??;
        Some(self.handle_response(host, notifier, response))
    }

    /// Wait for every pending request to be answered or to time out
    pub async fn wait_idle<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier)
    where
        H: EditorHost + ?Sized,
    {
        while let Some(oldest) = self.pending.values().map(|pending| pending.issued_at).min() {
            let remaining = (oldest + self.timeout).saturating_duration_since(Instant::now());
            let DispatchMode::Background(worker) = &mut self.mode else {
                return;
            };
            match tokio::time::timeout(remaining, worker.recv()).await {
                Ok(Some(response)) => {
                    self.handle_response(host, notifier, response);
                }
                Ok(None) => {
                    tracing::warn!("format worker stopped with {} pending requests", self.pending.len());
                    self.expire_stale(notifier, Instant::now() + self.timeout);
                    return;
                }
                Err(_) => {
                    self.expire_stale(notifier, Instant::now());
                }
            }
        }
    }

    /// Stop the worker thread
    pub fn shutdown(self) {
        if let DispatchMode::Background(worker) = self.mode {
            worker.shutdown();
        }
    }
}

//! Prettify Plugin - editor-side Prettier integration
//!
//! This crate provides:
//! - Settings: persisted user defaults and the settings page
//! - Host: the traits an editor implements, plus in-memory versions
//! - Worker: a background thread running the formatter
//! - Dispatcher: request building, correlation and result application
//! - Log: the bounded error log and its notifications
//! - Plugin: the lifecycle entry points an editor calls

/// Editor commands
pub mod commands;

/// Format dispatch
pub mod dispatcher;

/// Editor and notification traits
pub mod host;

/// Error log
pub mod log;

/// Plugin lifecycle
pub mod plugin;

/// Settings persistence
pub mod settings;

/// Background format worker
pub mod worker;

pub use commands::{Command, KeyBinding};
pub use dispatcher::{DispatchOutcome, FormatDispatcher, DEFAULT_REQUEST_TIMEOUT};
pub use host::{EditorHost, MemoryEditor, MemoryFile, Notification, Notifier, RecordingNotifier};
pub use log::{ErrorLog, LogEntry, LogKind, SourceLocation, COMMAND_PALETTE_HINT, MAX_LOG_ENTRIES, SIDE_BUTTON_HINT};
pub use plugin::Prettify;
pub use settings::{
    default_format_options, setting_items, PluginSettings, SettingControl, SettingItem, SettingsError,
    SettingsHandle, SettingsStore, SETTINGS_VERSION,
};
pub use worker::{FormatWorker, WorkerError};

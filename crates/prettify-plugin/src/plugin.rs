//! Plugin lifecycle
//!
//! [`Prettify`] ties the settings store, the dispatcher and the error log
//! together behind the entry points an editor calls: run a command, react
//! to a closed file or a settings change, drain worker responses, shut down.

use std::sync::Arc;
use std::time::Duration;

use prettify_core::{is_supported, FileId, Formatter};
use serde_json::Value;

use crate::commands::Command;
use crate::dispatcher::{DispatchOutcome, FormatDispatcher};
use crate::host::{EditorHost, Notifier};
use crate::log::ErrorLog;
use crate::settings::{setting_items, PluginSettings, SettingItem, SettingsError, SettingsStore};

/// The Prettier plugin
#[derive(Debug)]
pub struct Prettify {
    store: SettingsStore,
    dispatcher: FormatDispatcher,
}

impl Prettify {
    /// Start the plugin with a background worker
    pub fn new(store: SettingsStore, formatter: Arc<dyn Formatter>) -> Self {
        let dispatcher = FormatDispatcher::new(store.subscribe(), formatter);
        tracing::debug!(background = dispatcher.is_background(), "prettify started");
        Self { store, dispatcher }
    }

    /// Start the plugin formatting on the calling thread
    pub fn inline(store: SettingsStore, formatter: Arc<dyn Formatter>) -> Self {
        let dispatcher = FormatDispatcher::inline(store.subscribe(), formatter);
        Self { store, dispatcher }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.dispatcher = self.dispatcher.with_timeout(timeout);
        self
    }

    pub fn commands(&self) -> &'static [Command] {
        &Command::ALL
    }

    /// Whether the plugin registers itself as formatter for `file_name`
    pub fn handles(&self, file_name: &str) -> bool {
        is_supported(file_name)
    }

    /// Run a command against the active file
    pub async fn execute<H>(&mut self, command: Command, host: &mut H, notifier: &mut dyn Notifier) -> Option<DispatchOutcome>
    where
        H: EditorHost + ?Sized,
    {
        match command {
            Command::FormatSelection => {
                let Some(file) = host.active_file() else {
                    tracing::debug!("no active file to format");
                    return None;
                };
                Some(self.dispatcher.format_selection(host, notifier, &file).await)
            }
            Command::ShowLogs => {
                notifier.show_log();
                None
            }
        }
    }

    /// Format a whole file, as the editor's formatter hook does
    pub async fn format_file<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier, file: &FileId) -> DispatchOutcome
    where
        H: EditorHost + ?Sized,
    {
        self.dispatcher.format_document(host, notifier, file).await
    }

    /// Forget the errors of a closed file
    pub fn on_file_removed(&mut self, file: &FileId, notifier: &mut dyn Notifier) {
        self.dispatcher.clear_errors(notifier, file);
    }

    /// Jump to the location of log entry `index` and close the log view;
    /// returns false when the entry has no location
    pub fn open_log_entry<H>(&mut self, index: usize, host: &mut H, notifier: &mut dyn Notifier) -> bool
    where
        H: EditorHost + ?Sized,
    {
        let Some((file, position)) = self.dispatcher.log().jump_target(index) else {
            return false;
        };
        if !host.contains(&file) {
            return false;
        }
        host.focus_file(&file);
        host.move_cursor(&file, position);
        notifier.hide_log();
        true
    }

    pub fn log(&self) -> &ErrorLog {
        self.dispatcher.log()
    }

    pub fn pending_count(&self) -> usize {
        self.dispatcher.pending_count()
    }

    /// Apply finished worker responses
    pub fn poll<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier) -> usize
    where
        H: EditorHost + ?Sized,
    {
        self.dispatcher.poll(host, notifier)
    }

    /// Wait until every request has been answered or has timed out
    pub async fn wait_idle<H>(&mut self, host: &mut H, notifier: &mut dyn Notifier)
    where
        H: EditorHost + ?Sized,
    {
        self.dispatcher.wait_idle(host, notifier).await;
    }

    pub fn settings(&self) -> PluginSettings {
        self.store.current()
    }

    /// The settings page with current values
    pub fn setting_items(&self) -> Vec<SettingItem> {
        setting_items(&self.store.current())
    }

    /// Update and persist one setting
    pub fn on_settings_change(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        tracing::debug!(key, "setting changed");
        self.store.set(key, value)
    }

    /// Stop the worker
    pub fn shutdown(self) {
        self.dispatcher.shutdown();
    }
}

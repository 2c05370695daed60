//! The editor host seam
//!
//! The plugin never owns buffers or widgets. It reads and edits documents
//! through [`EditorHost`] and reports through [`Notifier`]. [`MemoryEditor`]
//! and [`RecordingNotifier`] are in-memory implementations for headless use
//! and tests.

use std::collections::HashMap;
use std::path::PathBuf;

use prettify_core::{replace_span, FileId, Position, Selection, SelectionSpan};

/// Document access provided by the editor
pub trait EditorHost {
    /// The file the user is currently editing
    fn active_file(&self) -> Option<FileId>;

    /// Display name, e.g. `main.ts`
    fn file_name(&self, file: &FileId) -> Option<String>;

    /// Location on disk; `None` for unsaved buffers
    fn file_path(&self, file: &FileId) -> Option<PathBuf>;

    /// Full text; `None` once the file is closed
    fn text(&self, file: &FileId) -> Option<String>;

    fn cursor(&self, file: &FileId) -> Option<Position>;

    /// Bring `file` to the front
    fn focus_file(&mut self, file: &FileId);

    fn selection(&self, file: &FileId) -> Option<Selection>;

    /// Replace the text covered by `span`; returns false if the file is gone
    fn replace(&mut self, file: &FileId, span: SelectionSpan, text: &str) -> bool;

    fn move_cursor(&mut self, file: &FileId, position: Position);

    fn clear_selection(&mut self, file: &FileId);

    /// Folders currently open as projects
    fn project_folders(&self) -> Vec<PathBuf>;

    fn contains(&self, file: &FileId) -> bool {
        self.text(file).is_some()
    }
}

/// User-facing notifications
pub trait Notifier {
    fn show_log(&mut self);

    fn hide_log(&mut self);

    fn toast(&mut self, message: &str);

    /// Show or hide the persistent log affordance
    fn set_side_button_visible(&mut self, visible: bool);

    /// Whether the editor shows side buttons at all
    fn side_buttons_enabled(&self) -> bool;
}

/// An open document in a [`MemoryEditor`]
#[derive(Debug, Clone, Default)]
pub struct MemoryFile {
    pub name: String,
    pub path: Option<PathBuf>,
    pub text: String,
    pub cursor: Position,
    pub selection: Selection,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// In-memory editor host
#[derive(Debug, Default)]
pub struct MemoryEditor {
    files: HashMap<FileId, MemoryFile>,
    active: Option<FileId>,
    folders: Vec<PathBuf>,
}

impl MemoryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file and make it active
    pub fn open(&mut self, id: impl Into<FileId>, file: MemoryFile) -> FileId {
        let id = id.into();
        self.files.insert(id.clone(), file);
        self.active = Some(id.clone());
        id
    }

    /// Close a file; returns it if it was open
    pub fn close(&mut self, id: &FileId) -> Option<MemoryFile> {
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        self.files.remove(id)
    }

    pub fn activate(&mut self, id: &FileId) {
        if self.files.contains_key(id) {
            self.active = Some(id.clone());
        }
    }

    pub fn add_folder(&mut self, folder: impl Into<PathBuf>) {
        self.folders.push(folder.into());
    }

    pub fn file(&self, id: &FileId) -> Option<&MemoryFile> {
        self.files.get(id)
    }

    pub fn file_mut(&mut self, id: &FileId) -> Option<&mut MemoryFile> {
        self.files.get_mut(id)
    }
}

impl EditorHost for MemoryEditor {
    fn active_file(&self) -> Option<FileId> {
        self.active.clone()
    }

    fn file_name(&self, file: &FileId) -> Option<String> {
        self.files.get(file).map(|f| f.name.clone())
    }

    fn file_path(&self, file: &FileId) -> Option<PathBuf> {
        self.files.get(file).and_then(|f| f.path.clone())
    }

    fn text(&self, file: &FileId) -> Option<String> {
        self.files.get(file).map(|f| f.text.clone())
    }

    fn cursor(&self, file: &FileId) -> Option<Position> {
        self.files.get(file).map(|f| f.cursor)
    }

    fn selection(&self, file: &FileId) -> Option<Selection> {
        self.files.get(file).map(|f| f.selection)
    }

    fn focus_file(&mut self, file: &FileId) {
        self.activate(file);
    }

    fn replace(&mut self, file: &FileId, span: SelectionSpan, text: &str) -> bool {
        let Some(f) = self.files.get_mut(file) else {
            return false;
        };
        f.text = replace_span(&f.text, span, text);
        true
    }

    fn move_cursor(&mut self, file: &FileId, position: Position) {
        if let Some(f) = self.files.get_mut(file) {
            f.cursor = position;
            f.selection = Selection::caret(position);
        }
    }

    fn clear_selection(&mut self, file: &FileId) {
        if let Some(f) = self.files.get_mut(file) {
            f.selection = Selection::caret(f.cursor);
        }
    }

    fn project_folders(&self) -> Vec<PathBuf> {
        self.folders.clone()
    }

    fn contains(&self, file: &FileId) -> bool {
        self.files.contains_key(file)
    }
}

/// A notification issued through [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ShowLog,
    HideLog,
    Toast(String),
    SideButton(bool),
}

/// Notifier that records what it was asked to do
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub events: Vec<Notification>,
    pub side_buttons: bool,
    pub log_visible: bool,
    pub side_button_visible: bool,
}

impl RecordingNotifier {
    pub fn new(side_buttons: bool) -> Self {
        Self {
            side_buttons,
            ..Self::default()
        }
    }

    /// Toast messages issued so far
    pub fn toasts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Notification::Toast(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn show_log(&mut self) {
        self.log_visible = true;
        self.events.push(Notification::ShowLog);
    }

    fn hide_log(&mut self) {
        self.log_visible = false;
        self.events.push(Notification::HideLog);
    }

    fn toast(&mut self, message: &str) {
        self.events.push(Notification::Toast(message.to_string()));
    }

    fn set_side_button_visible(&mut self, visible: bool) {
        self.side_button_visible = visible;
        self.events.push(Notification::SideButton(visible));
    }

    fn side_buttons_enabled(&self) -> bool {
        self.side_buttons
    }
}

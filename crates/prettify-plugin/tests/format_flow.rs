//! End-to-end formatting through the plugin with a test engine

use std::sync::{Arc, Mutex};
use std::time::Duration;

use prettify_core::{
    EngineError, FileId, FormatRequest, FormatResult, Formatter, Position, RequestId, Selection, WorkerResponse,
    FORMAT_ACTION,
};
use prettify_plugin::{
    Command, DispatchOutcome, EditorHost, FormatDispatcher, LogKind, MemoryEditor, MemoryFile, PluginSettings, Prettify,
    RecordingNotifier, SettingsStore, COMMAND_PALETTE_HINT, MAX_LOG_ENTRIES, SIDE_BUTTON_HINT,
};
use tempfile::TempDir;

/// Spaces around `=`, one statement per line ending in `;`. Source containing
/// `@@` is a syntax error.
#[derive(Default)]
struct TestEngine {
    seen: Mutex<Vec<FormatRequest>>,
    delay: Option<Duration>,
}

impl TestEngine {
    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn requests(&self) -> Vec<FormatRequest> {
        self.seen.lock().unwrap().clone()
    }
}

fn tidy(code: &str) -> String {
    let mut out = String::new();
    for line in code.lines() {
        let line = line.split('=').map(str::trim).collect::<Vec<_>>().join(" = ");
        if !line.is_empty() {
            out.push_str(&line);
            if !line.ends_with(';') {
                out.push(';');
            }
        }
        out.push('\n');
    }
    out
}

/// Move the cursor past the same number of non-space characters
fn track_cursor(input: &str, offset: usize, output: &str) -> usize {
    let seen = input.chars().take(offset).filter(|c| !c.is_whitespace()).count();
    let mut count = 0;
    for (index, c) in output.chars().enumerate() {
        if count == seen {
            return index;
        }
        if !c.is_whitespace() {
            count += 1;
        }
    }
    output.chars().count()
}

impl Formatter for TestEngine {
    fn format(&self, request: &FormatRequest) -> Result<FormatResult, EngineError> {
        self.seen.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(index) = request.code.find("@@") {
            return Err(EngineError::format(format!("SyntaxError: Unexpected token (1:{})", index + 1)));
        }
        let formatted = tidy(&request.code);
        Ok(match request.options.cursor_offset {
            Some(offset) => FormatResult::WithCursor {
                cursor_offset: track_cursor(&request.code, offset, &formatted),
                formatted,
            },
            None => FormatResult::Plain(formatted),
        })
    }
}

fn store() -> SettingsStore {
    SettingsStore::in_memory(PluginSettings::default())
}

fn quiet_store() -> SettingsStore {
    SettingsStore::in_memory(PluginSettings {
        open_error_page_on_errors: false,
        ..PluginSettings::default()
    })
}

fn background(engine: &Arc<TestEngine>) -> Prettify {
    Prettify::new(store(), Arc::clone(engine) as Arc<dyn Formatter>)
}

fn inline(engine: &Arc<TestEngine>, store: SettingsStore) -> Prettify {
    Prettify::inline(store, Arc::clone(engine) as Arc<dyn Formatter>)
}

#[tokio::test]
async fn test_whole_document_with_cursor() {
    let engine = Arc::new(TestEngine::default());
    let mut plugin = background(&engine);
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);

    let mut file = MemoryFile::new("main.js", "const x=1");
    file.cursor = Position::new(0, 9);
    let id = editor.open("f1", file);

    let outcome = plugin.execute(Command::FormatSelection, &mut editor, &mut notifier).await;
    assert!(matches!(outcome, Some(DispatchOutcome::Queued(_))));
    assert_eq!(plugin.pending_count(), 1);

    plugin.wait_idle(&mut editor, &mut notifier).await;

    assert_eq!(editor.text(&id).as_deref(), Some("const x = 1;\n"));
    assert_eq!(editor.cursor(&id), Some(Position::new(0, 11)));
    assert!(plugin.log().is_empty());

    let requests = engine.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].options.parser, "babel");
    assert_eq!(requests[0].options.filepath, "main.js");
    assert_eq!(requests[0].options.cursor_offset, Some(9));
    assert_eq!(requests[0].options.options.tab_width, Some(4));
    assert!(!requests[0].is_selection);

    plugin.shutdown();
}

#[tokio::test]
async fn test_selection_replaces_only_selected_lines() {
    let engine = Arc::new(TestEngine::default());
    let mut plugin = background(&engine);
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);

    let mut file = MemoryFile::new("view.tsx", "a\nb=2\nc=3\nd");
    file.selection = Selection::new(Position::new(1, 1), Position::new(2, 1));
    let id = editor.open("f1", file);

    plugin.execute(Command::FormatSelection, &mut editor, &mut notifier).await;
    plugin.wait_idle(&mut editor, &mut notifier).await;

    assert_eq!(editor.text(&id).as_deref(), Some("a\nb = 2;\nc = 3;\nd"));
    assert!(editor.selection(&id).unwrap().is_empty());

    let request = &engine.requests()[0];
    assert!(request.is_selection);
    assert_eq!(request.code, "b=2\nc=3");
    assert_eq!(request.options.parser, "typescript");
    assert_eq!(request.options.cursor_offset, None);
    assert_eq!(request.options.options.range_start, Some(0));
    assert_eq!(request.options.options.range_end, None);

    plugin.shutdown();
}

#[tokio::test]
async fn test_failure_leaves_document_and_success_clears_log() {
    let engine = Arc::new(TestEngine::default());
    let mut plugin = inline(&engine, store());
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);
    let other = editor.open("f2", MemoryFile::new("b.js", "@@"));
    let id = editor.open("f1", MemoryFile::new("a.js", "x=@@1"));

    plugin.format_file(&mut editor, &mut notifier, &other).await;
    let outcome = plugin.format_file(&mut editor, &mut notifier, &id).await;
    assert_eq!(outcome, DispatchOutcome::Failed);
    assert_eq!(editor.text(&id).as_deref(), Some("x=@@1"));
    assert_eq!(plugin.log().len(), 2);

    let entry = plugin.log().get(0).unwrap();
    assert_eq!(entry.kind, LogKind::Format);
    assert_eq!(entry.file_name, "a.js");
    assert_eq!(entry.jump_target(), Some(Position::new(0, 2)));
    assert!(notifier.log_visible);
    assert!(notifier.side_button_visible);

    editor.file_mut(&id).unwrap().text = "x=1".to_string();
    let outcome = plugin.format_file(&mut editor, &mut notifier, &id).await;
    assert_eq!(outcome, DispatchOutcome::Applied);
    assert_eq!(editor.text(&id).as_deref(), Some("x = 1;\n"));
    assert_eq!(plugin.log().len(), 1);
    assert!(!plugin.log().has_errors_for(&id));
    assert!(notifier.side_button_visible);

    editor.file_mut(&other).unwrap().text = "y=2".to_string();
    plugin.format_file(&mut editor, &mut notifier, &other).await;
    assert!(plugin.log().is_empty());
    assert!(!notifier.side_button_visible);
}

#[tokio::test]
async fn test_log_keeps_ten_most_recent() {
    let engine = Arc::new(TestEngine::default());
    let mut plugin = inline(&engine, quiet_store());
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);

    for i in 0..11 {
        let id = editor.open(format!("file{i}").as_str(), MemoryFile::new(format!("f{i}.js"), "@@"));
        plugin.format_file(&mut editor, &mut notifier, &id).await;
    }

    assert_eq!(plugin.log().len(), MAX_LOG_ENTRIES);
    assert_eq!(plugin.log().get(0).unwrap().file_id, FileId::new("file10"));
    assert!(!plugin.log().has_errors_for(&FileId::new("file0")));
    assert_eq!(notifier.toasts().len(), 11);
}

#[tokio::test]
async fn test_toast_wording_follows_side_buttons() {
    let engine = Arc::new(TestEngine::default());
    let mut editor = MemoryEditor::new();
    let id = editor.open("f1", MemoryFile::new("a.js", "@@"));

    let mut plugin = inline(&engine, quiet_store());
    let mut notifier = RecordingNotifier::new(true);
    plugin.format_file(&mut editor, &mut notifier, &id).await;
    assert_eq!(notifier.toasts(), vec![SIDE_BUTTON_HINT]);
    assert!(!notifier.log_visible);

    let mut plugin = inline(&engine, quiet_store());
    let mut notifier = RecordingNotifier::new(false);
    plugin.format_file(&mut editor, &mut notifier, &id).await;
    assert_eq!(notifier.toasts(), vec![COMMAND_PALETTE_HINT]);
}

#[tokio::test]
async fn test_response_for_closed_file_is_dropped() {
    let engine = Arc::new(TestEngine::default());
    let mut plugin = background(&engine);
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);
    let id = editor.open("f1", MemoryFile::new("a.js", "x=1"));

    plugin.format_file(&mut editor, &mut notifier, &id).await;
    editor.close(&id);
    plugin.wait_idle(&mut editor, &mut notifier).await;

    assert_eq!(plugin.pending_count(), 0);
    assert!(plugin.log().is_empty());
    assert!(notifier.events.is_empty());

    plugin.shutdown();
}

#[tokio::test]
async fn test_unknown_response_is_dropped() {
    let engine: Arc<dyn Formatter> = Arc::new(TestEngine::default());
    let store = store();
    let mut dispatcher = FormatDispatcher::inline(store.subscribe(), engine);
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);
    let id = editor.open("f1", MemoryFile::new("a.js", "x=1"));

    let response = WorkerResponse {
        id: RequestId(42),
        file_id: id.clone(),
        action: FORMAT_ACTION.to_string(),
        res: Some(FormatResult::Plain("hijacked\n".to_string())),
        error: None,
        is_selection: false,
        selection_range: None,
    };
    assert_eq!(
        dispatcher.handle_response(&mut editor, &mut notifier, response),
        DispatchOutcome::Dropped
    );
    assert_eq!(editor.text(&id).as_deref(), Some("x=1"));
}

#[tokio::test]
async fn test_timeout_expires_request_and_drops_late_response() {
    let engine = Arc::new(TestEngine::slow(Duration::from_millis(300)));
    let mut plugin = background(&engine).with_timeout(Duration::from_millis(30));
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);
    let id = editor.open("f1", MemoryFile::new("a.js", "x=1"));

    plugin.format_file(&mut editor, &mut notifier, &id).await;
    plugin.wait_idle(&mut editor, &mut notifier).await;

    assert_eq!(plugin.pending_count(), 0);
    assert_eq!(plugin.log().len(), 1);
    assert_eq!(plugin.log().get(0).unwrap().kind, LogKind::Timeout);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(plugin.poll(&mut editor, &mut notifier), 1);
    assert_eq!(editor.text(&id).as_deref(), Some("x=1"));

    plugin.shutdown();
}

#[tokio::test]
async fn test_project_config_replaces_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".prettierrc"), r#"{ "tabWidth": 8, "semi": false }"#).unwrap();

    let engine = Arc::new(TestEngine::default());
    let mut plugin = inline(&engine, store());
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);
    editor.add_folder(dir.path());
    let id = editor.open("f1", MemoryFile::new("a.js", "x=1").with_path(dir.path().join("a.js")));

    assert_eq!(
        plugin.format_file(&mut editor, &mut notifier, &id).await,
        DispatchOutcome::Applied
    );

    let options = &engine.requests()[0].options.options;
    assert_eq!(options.tab_width, Some(8));
    assert_eq!(options.semi, Some(false));
    assert_eq!(options.print_width, None);
}

#[tokio::test]
async fn test_malformed_project_config_is_logged() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".prettierrc.json"), "{ tabWidth: ").unwrap();

    let engine = Arc::new(TestEngine::default());
    let mut plugin = inline(&engine, quiet_store());
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(false);
    editor.add_folder(dir.path());
    let id = editor.open("f1", MemoryFile::new("a.js", "x=1").with_path(dir.path().join("a.js")));

    assert_eq!(
        plugin.format_file(&mut editor, &mut notifier, &id).await,
        DispatchOutcome::Failed
    );
    assert!(engine.requests().is_empty());
    assert_eq!(editor.text(&id).as_deref(), Some("x=1"));
    assert_eq!(plugin.log().get(0).unwrap().kind, LogKind::Config);
    assert_eq!(notifier.toasts(), vec![COMMAND_PALETTE_HINT]);
}

#[tokio::test]
async fn test_settings_change_reaches_next_request() {
    let engine = Arc::new(TestEngine::default());
    let mut plugin = inline(&engine, store());
    let mut editor = MemoryEditor::new();
    let mut notifier = RecordingNotifier::new(true);
    let id = editor.open("f1", MemoryFile::new("a.js", "x=1"));

    plugin.on_settings_change("printWidth", serde_json::json!("100")).unwrap();
    plugin.format_file(&mut editor, &mut notifier, &id).await;

    assert_eq!(engine.requests()[0].options.options.print_width, Some(100));
}

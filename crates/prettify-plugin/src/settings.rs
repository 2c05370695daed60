//! Plugin settings persistence
//!
//! Stores the user's default Prettier options plus plugin preferences as a
//! versioned JSON object. The [`SettingsStore`] owns the current value and
//! publishes every change through a `tokio::sync::watch` channel; consumers
//! hold a [`SettingsHandle`] and read the latest snapshot when they need it.

use std::path::{Path, PathBuf};

use prettify_core::{
    ArrowParens, EmbeddedLanguageFormatting, EndOfLine, FormatOptions, HtmlWhitespaceSensitivity, ProseWrap,
    QuoteProps, TrailingComma,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::watch;

/// Settings schema version; a persisted record with another version is
/// replaced by defaults
pub const SETTINGS_VERSION: u32 = 3;

/// Errors that can occur while loading or updating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to access settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config directory not found")]
    NoConfigDir,

    #[error("unknown setting '{0}'")]
    UnknownKey(String),

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// User defaults and plugin preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    #[serde(default)]
    pub version: u32,
    /// Show the log view on error instead of a toast
    #[serde(default = "default_open_error_page")]
    pub open_error_page_on_errors: bool,
    #[serde(flatten)]
    pub options: FormatOptions,
}

fn default_open_error_page() -> bool {
    true
}

/// The options used when a project has no config file
pub fn default_format_options() -> FormatOptions {
    FormatOptions {
        print_width: Some(80),
        tab_width: Some(4),
        use_tabs: Some(false),
        semi: Some(true),
        single_quote: Some(false),
        quote_props: Some(QuoteProps::AsNeeded),
        jsx_single_quote: Some(false),
        trailing_comma: Some(TrailingComma::None),
        bracket_spacing: Some(true),
        bracket_same_line: Some(false),
        arrow_parens: Some(ArrowParens::Avoid),
        range_start: Some(0),
        range_end: None,
        require_pragma: Some(false),
        insert_pragma: Some(false),
        prose_wrap: Some(ProseWrap::Preserve),
        html_whitespace_sensitivity: Some(HtmlWhitespaceSensitivity::Css),
        vue_indent_script_and_style: Some(false),
        end_of_line: Some(EndOfLine::Lf),
        embedded_language_formatting: Some(EmbeddedLanguageFormatting::Auto),
        single_attribute_per_line: Some(false),
        extra: Map::new(),
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            open_error_page_on_errors: true,
            options: default_format_options(),
        }
    }
}

impl PluginSettings {
    /// Interpret a persisted record
    ///
    /// Returns `None` when the record is missing, not an object or carries a
    /// different version; the caller then writes defaults back. Otherwise each
    /// persisted key overlays the defaults on its own, and a key whose value
    /// does not fit is skipped.
    pub fn from_persisted(persisted: Option<&Value>) -> Option<Self> {
        let persisted = persisted?.as_object()?;
        if persisted.get("version").and_then(Value::as_u64) != Some(u64::from(SETTINGS_VERSION)) {
            return None;
        }

        let Ok(Value::Object(mut merged)) = serde_json::to_value(Self::default()) else {
            return None;
        };
        for (key, value) in persisted {
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<Self>(Value::Object(candidate.clone())) {
                Ok(_) => merged = candidate,
                Err(e) => tracing::warn!(key = %key, "ignoring invalid persisted setting: {}", e),
            }
        }
        serde_json::from_value(Value::Object(merged)).ok()
    }
}

/// How a setting is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingControl {
    Checkbox,
    Number { prompt: &'static str },
    Select(&'static [&'static str]),
}

/// A row of the settings page
#[derive(Debug, Clone, PartialEq)]
pub struct SettingItem {
    pub key: &'static str,
    pub text: &'static str,
    pub info: &'static str,
    pub control: SettingControl,
    /// Current value; `null` for an unbounded `rangeEnd`
    pub value: Value,
}

struct SettingDefinition {
    key: &'static str,
    text: &'static str,
    info: &'static str,
    control: SettingControl,
}

const fn setting(key: &'static str, text: &'static str, info: &'static str, control: SettingControl) -> SettingDefinition {
    SettingDefinition {
        key,
        text,
        info,
        control,
    }
}

const SETTINGS_PAGE: &[SettingDefinition] = &[
    setting("openErrorPageOnErrors", "Open logs page on error", "Open logs page when an error occurs.", SettingControl::Checkbox),
    setting("printWidth", "Print Width", "The line length where Prettier will try wrap.", SettingControl::Number { prompt: "Enter print width" }),
    setting("tabWidth", "Tab Width", "Number of spaces per indentation level.", SettingControl::Number { prompt: "Enter tab width" }),
    setting("useTabs", "Use Tabs", "Indent lines with tabs instead of spaces.", SettingControl::Checkbox),
    setting("semi", "Semicolons", "Print semicolons at the ends of statements.", SettingControl::Checkbox),
    setting("singleQuote", "Single Quote", "Use single quotes instead of double quotes.", SettingControl::Checkbox),
    setting("quoteProps", "Quote Props", "Change when properties in objects are quoted.", SettingControl::Select(&["as-needed", "consistent", "preserve"])),
    setting("jsxSingleQuote", "JSX Single Quote", "Use single quotes instead of double quotes in JSX.", SettingControl::Checkbox),
    setting("trailingComma", "Trailing Comma", "Print trailing commas wherever possible.", SettingControl::Select(&["none", "es5", "all"])),
    setting("bracketSpacing", "Bracket Spacing", "Print spaces between brackets in object literals.", SettingControl::Checkbox),
    setting("bracketSameLine", "Bracket Same Line", "Put the > of a multi-line JSX element at the end of the last line instead of being alone on the next line.", SettingControl::Checkbox),
    setting("arrowParens", "Arrow Parens", "Include parentheses around a sole arrow function parameter.", SettingControl::Select(&["avoid", "always"])),
    setting("rangeStart", "Range Start", "Format only a segment of a file.", SettingControl::Number { prompt: "Enter range start" }),
    setting("rangeEnd", "Range End", "Format only a segment of a file.", SettingControl::Number { prompt: "Enter range end" }),
    setting("requirePragma", "Require Pragma", "Require either '@prettier' or '@format' to be present in the file's first docblock comment.", SettingControl::Checkbox),
    setting("insertPragma", "Insert Pragma", "Insert '@format' pragma into the docblock, if none is present.", SettingControl::Checkbox),
    setting("proseWrap", "Prose Wrap", "How to wrap prose.", SettingControl::Select(&["always", "never", "preserve"])),
    setting("htmlWhitespaceSensitivity", "HTML Whitespace Sensitivity", "How to handle whitespaces in HTML.", SettingControl::Select(&["css", "strict", "ignore"])),
    setting("vueIndentScriptAndStyle", "Vue Indent Script And Style", "Indent script and style tags in Vue files.", SettingControl::Checkbox),
    setting("endOfLine", "End Of Line", "Which end of line characters to apply.", SettingControl::Select(&["lf", "crlf", "cr", "auto"])),
    setting("embeddedLanguageFormatting", "Embedded Language Formatting", "Enable/disable embedded language formatting.", SettingControl::Select(&["auto", "off"])),
    setting("singleAttributePerLine", "Single Attribute Per Line", "Put each attribute in a separate line.", SettingControl::Checkbox),
];

/// Describe the settings page with the current values filled in
pub fn setting_items(settings: &PluginSettings) -> Vec<SettingItem> {
    let values = match serde_json::to_value(settings) {
        Ok(Value::Object(values)) => values,
        _ => Map::new(),
    };
    SETTINGS_PAGE
        .iter()
        .map(|definition| SettingItem {
            key: definition.key,
            text: definition.text,
            info: definition.info,
            control: definition.control,
            value: values.get(definition.key).cloned().unwrap_or(Value::Null),
        })
        .collect()
}

/// Number prompts may hand back text; `rangeEnd` accepts "Infinity" or an
/// empty answer as unbounded
fn coerce(key: &str, control: SettingControl, value: Value) -> Result<Value, SettingsError> {
    let SettingControl::Number { .. } = control else {
        return Ok(value);
    };
    let Value::String(text) = &value else {
        return Ok(value);
    };
    let text = text.trim();
    if key == "rangeEnd" && (text.is_empty() || text.eq_ignore_ascii_case("infinity")) {
        return Ok(Value::Null);
    }
    text.parse::<u64>()
        .map(Value::from)
        .map_err(|e| SettingsError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Read-only view of the settings that follows every update
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    receiver: watch::Receiver<PluginSettings>,
}

impl SettingsHandle {
    /// The latest settings
    pub fn snapshot(&self) -> PluginSettings {
        self.receiver.borrow().clone()
    }

    /// Whether settings changed since the last [`snapshot_and_mark_seen`](Self::snapshot_and_mark_seen)
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    pub fn snapshot_and_mark_seen(&mut self) -> PluginSettings {
        self.receiver.borrow_and_update().clone()
    }

    /// Wait for the next change; returns false once the store is dropped
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

/// Owner of the plugin settings
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    sender: watch::Sender<PluginSettings>,
}

impl SettingsStore {
    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prettify").join("settings.json"))
    }

    /// Load settings from the default location
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        Self::open(path)
    }

    /// Load settings from `path`, writing defaults back when the file is
    /// missing, unreadable as settings or from another version
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let persisted = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Value>(&content)
                .map_err(|e| tracing::warn!("settings file {} is not valid JSON: {}", path.display(), e))
                .ok(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(SettingsError::Io { path, source }),
        };

        let store = match PluginSettings::from_persisted(persisted.as_ref()) {
            Some(settings) => Self::with_path(Some(path), settings),
            None => {
                tracing::debug!("writing default settings to {}", path.display());
                let store = Self::with_path(Some(path), PluginSettings::default());
                store.save(&PluginSettings::default())?;
                store
            }
        };
        Ok(store)
    }

    /// Settings that are never written to disk
    pub fn in_memory(settings: PluginSettings) -> Self {
        Self::with_path(None, settings)
    }

    fn with_path(path: Option<PathBuf>, settings: PluginSettings) -> Self {
        let (sender, _) = watch::channel(settings);
        Self { path, sender }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The current settings
    pub fn current(&self) -> PluginSettings {
        self.sender.borrow().clone()
    }

    /// A handle that observes every future update
    pub fn subscribe(&self) -> SettingsHandle {
        SettingsHandle {
            receiver: self.sender.subscribe(),
        }
    }

    /// Update one setting by its persisted key, persist, and notify
    pub fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let definition = SETTINGS_PAGE
            .iter()
            .find(|definition| definition.key == key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        let value = coerce(key, definition.control, value)?;

        let Value::Object(mut values) = serde_json::to_value(self.current())? else {
            return Err(SettingsError::InvalidValue {
                key: key.to_string(),
                message: "settings are not an object".to_string(),
            });
        };
        values.insert(key.to_string(), value);
        let updated: PluginSettings =
            serde_json::from_value(Value::Object(values)).map_err(|e| SettingsError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        self.replace(updated)
    }

    /// Replace all settings, persist, and notify
    pub fn replace(&self, settings: PluginSettings) -> Result<(), SettingsError> {
        self.save(&settings)?;
        self.sender.send_replace(settings);
        Ok(())
    }

    fn save(&self, settings: &PluginSettings) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings() {
        let settings = PluginSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert!(settings.open_error_page_on_errors);
        assert_eq!(settings.options.print_width, Some(80));
        assert_eq!(settings.options.tab_width, Some(4));
        assert_eq!(settings.options.trailing_comma, Some(TrailingComma::None));
        assert_eq!(settings.options.range_end, None);
    }

    #[test]
    fn test_plugin_key_is_not_a_format_option() {
        let value = serde_json::to_value(PluginSettings::default()).unwrap();
        assert_eq!(value["openErrorPageOnErrors"], json!(true));
        assert!(PluginSettings::default().options.extra.is_empty());
    }

    #[test]
    fn test_persisted_values_overlay_defaults() {
        let persisted = json!({ "version": 3, "tabWidth": 2, "openErrorPageOnErrors": false });
        let settings = PluginSettings::from_persisted(Some(&persisted)).unwrap();
        assert_eq!(settings.options.tab_width, Some(2));
        assert_eq!(settings.options.print_width, Some(80));
        assert!(!settings.open_error_page_on_errors);
        assert_eq!(settings.options.range_end, None);
    }

    #[test]
    fn test_invalid_value_skips_only_that_key() {
        let persisted = json!({ "version": 3, "tabWidth": 2, "semi": false, "printWidth": "100" });
        let settings = PluginSettings::from_persisted(Some(&persisted)).unwrap();
        assert_eq!(settings.options.tab_width, Some(2));
        assert_eq!(settings.options.semi, Some(false));
        assert_eq!(settings.options.print_width, Some(80));
    }

    #[test]
    fn test_open_keeps_valid_settings_next_to_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let content = r#"{ "version": 3, "tabWidth": 2, "semi": false, "printWidth": "100" }"#;
        std::fs::write(&path, content).unwrap();

        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.current().options.tab_width, Some(2));
        assert_eq!(store.current().options.semi, Some(false));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        assert!(PluginSettings::from_persisted(Some(&json!({ "version": 2, "tabWidth": 2 }))).is_none());
        assert!(PluginSettings::from_persisted(Some(&json!("nope"))).is_none());
        assert!(PluginSettings::from_persisted(None).is_none());
    }

    #[test]
    fn test_setting_items_reflect_values() {
        let items = setting_items(&PluginSettings::default());
        assert_eq!(items.len(), 22);
        let print_width = items.iter().find(|item| item.key == "printWidth").unwrap();
        assert_eq!(print_width.value, json!(80));
        let range_end = items.iter().find(|item| item.key == "rangeEnd").unwrap();
        assert_eq!(range_end.value, Value::Null);
    }

    #[test]
    fn test_set_notifies_subscribers() {
        let store = SettingsStore::in_memory(PluginSettings::default());
        let mut handle = store.subscribe();
        assert!(!handle.has_changed());

        store.set("semi", json!(false)).unwrap();
        assert!(handle.has_changed());
        assert_eq!(handle.snapshot_and_mark_seen().options.semi, Some(false));
        assert!(!handle.has_changed());
    }

    #[test]
    fn test_set_coerces_number_prompts() {
        let store = SettingsStore::in_memory(PluginSettings::default());
        store.set("printWidth", json!("100")).unwrap();
        store.set("rangeEnd", json!("Infinity")).unwrap();
        let settings = store.current();
        assert_eq!(settings.options.print_width, Some(100));
        assert_eq!(settings.options.range_end, None);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let store = SettingsStore::in_memory(PluginSettings::default());
        assert!(matches!(store.set("colour", json!(1)), Err(SettingsError::UnknownKey(_))));
        assert!(matches!(
            store.set("trailingComma", json!("sometimes")),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert_eq!(store.current(), PluginSettings::default());
    }

    #[test]
    fn test_open_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prettify").join("settings.json");
        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.current(), PluginSettings::default());

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["version"], json!(SETTINGS_VERSION));
    }

    #[test]
    fn test_open_replaces_stale_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "version": 1, "tabWidth": 8 }"#).unwrap();

        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.current().options.tab_width, Some(4));
    }

    #[test]
    fn test_settings_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        SettingsStore::open(&path).unwrap().set("singleQuote", json!(true)).unwrap();

        let reloaded = SettingsStore::open(&path).unwrap();
        assert_eq!(reloaded.current().options.single_quote, Some(true));
    }
}

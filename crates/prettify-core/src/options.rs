//! Prettier option record
//!
//! Every field is optional: a project config replaces the user's defaults as
//! a whole, so anything it leaves out falls back to Prettier's own default.
//! Keys this crate does not model (`plugins`, `overrides`, parser specific
//! options) are kept in `extra` and forwarded untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// When object properties are quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteProps {
    AsNeeded,
    Consistent,
    Preserve,
}

/// Trailing comma policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingComma {
    None,
    Es5,
    All,
}

/// Parentheses around a sole arrow function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowParens {
    Avoid,
    Always,
}

/// Markdown prose wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProseWrap {
    Always,
    Never,
    Preserve,
}

/// Whitespace handling in HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlWhitespaceSensitivity {
    Css,
    Strict,
    Ignore,
}

/// Line ending written by the formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfLine {
    Lf,
    Crlf,
    Cr,
    Auto,
}

/// Formatting of code embedded in other languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddedLanguageFormatting {
    Auto,
    Off,
}

/// The Prettier option record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_tabs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_quote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_props: Option<QuoteProps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsx_single_quote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_comma: Option<TrailingComma>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket_spacing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket_same_line: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrow_parens: Option<ArrowParens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<usize>,
    /// `None` means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_pragma: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_pragma: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prose_wrap: Option<ProseWrap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_whitespace_sensitivity: Option<HtmlWhitespaceSensitivity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vue_indent_script_and_style: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_of_line: Option<EndOfLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_language_formatting: Option<EmbeddedLanguageFormatting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_attribute_per_line: Option<bool>,

    /// Options not modelled above, forwarded verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormatOptions {
    /// Options for formatting a selection in isolation: the whole snippet,
    /// never a sub-range of it
    #[must_use]
    pub fn for_selection(mut self) -> Self {
        self.range_start = Some(0);
        self.range_end = None;
        self
    }
}

/// Options as sent to the engine: always carries a parser and a file path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorOptions {
    pub parser: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_offset: Option<usize>,
    pub filepath: String,
    #[serde(flatten)]
    pub options: FormatOptions,
}

impl CursorOptions {
    /// Build the engine options
    ///
    /// A `parser` or `filepath` set in the project config takes precedence
    /// over the inferred values.
    #[must_use]
    pub fn new(parser: String, filepath: String, mut options: FormatOptions) -> Self {
        let parser = match options.extra.remove("parser") {
            Some(Value::String(configured)) => configured,
            _ => parser,
        };
        let filepath = match options.extra.remove("filepath") {
            Some(Value::String(configured)) => configured,
            _ => filepath,
        };
        Self {
            parser,
            cursor_offset: None,
            filepath,
            options,
        }
    }

    #[must_use]
    pub fn with_cursor_offset(mut self, offset: usize) -> Self {
        self.cursor_offset = Some(offset);
        self
    }
}

//! Prettify Core - formatter-independent building blocks for Prettier integrations
//!
//! This crate provides:
//! - Position: translation between editor positions and flat text offsets
//! - Parser: inference of the Prettier parser from a file name
//! - Options: the Prettier option record and its wire form
//! - Config: discovery and parsing of project `.prettierrc` files
//! - Engine: the seam to the formatting engine
//! - Protocol: messages exchanged with a background format worker
//! - Bridge: a `Formatter` backed by a Node.js process running Prettier

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Position/offset translation and selection expansion
pub mod position;

/// File name to parser identifier mapping
pub mod parser;

/// Prettier option record
pub mod options;

/// Project configuration discovery
pub mod config;

/// Formatting engine trait and result types
pub mod engine;

/// Worker request/response messages
pub mod protocol;

/// Node.js process bridge
pub mod bridge;

pub use bridge::NodeBridge;
pub use config::{resolve_config, resolve_config_blocking, ConfigError, ConfigFormat, ResolvedConfig, CONFIG_FILES};
pub use engine::{EngineError, ErrorInfo, FormatRequest, FormatResult, Formatter};
pub use options::{
    ArrowParens, CursorOptions, EmbeddedLanguageFormatting, EndOfLine, FormatOptions,
    HtmlWhitespaceSensitivity, ProseWrap, QuoteProps, TrailingComma,
};
pub use parser::{infer_parser, is_supported, SUPPORTED_EXTENSIONS};
pub use position::{
    char_to_utf16_offset, document_span, expand_selection, offset_to_position, position_to_offset, replace_span,
    utf16_to_char_offset, Position, Selection, SelectionSpan,
};
pub use protocol::{FileId, RequestId, WorkerRequest, WorkerResponse, FORMAT_ACTION};

//! A `Formatter` backed by a Node.js process running Prettier
//!
//! Each format call spawns the configured program with a small bridge script,
//! writes one JSON request on stdin and reads one JSON reply from stdout.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, FormatRequest, FormatResult, Formatter};
use crate::options::CursorOptions;
use crate::position::{char_to_utf16_offset, utf16_to_char_offset};

/// Bridge script evaluated by `node -e`
///
/// `PRETTIFY_PRETTIER` names the module to import (defaults to `prettier`).
/// A `null` rangeEnd means unbounded and is mapped to `Infinity`.
pub const BRIDGE_SCRIPT: &str = r#"
const chunks = [];
process.stdin.on("data", (chunk) => chunks.push(chunk));
process.stdin.on("end", async () => {
  const reply = (value) => process.stdout.write(JSON.stringify(value));
  try {
    const prettier = await import(process.env.PRETTIFY_PRETTIER || "prettier");
    const { code, options, isSelection } = JSON.parse(Buffer.concat(chunks).toString("utf8"));
    if (options.rangeEnd === undefined || options.rangeEnd === null) options.rangeEnd = Infinity;
    const ok = isSelection
      ? await prettier.format(code, options)
      : await prettier.formatWithCursor(code, options);
    reply({ ok });
  } catch (error) {
    reply({ error: { message: String(error && error.message ? error.message : error) } });
  }
});
"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BridgeInput<'a> {
    code: &'a str,
    options: &'a CursorOptions,
    is_selection: bool,
}

#[derive(Deserialize)]
struct BridgeError {
    message: String,
}

#[derive(Deserialize)]
struct BridgeOutput {
    #[serde(default)]
    ok: Option<FormatResult>,
    #[serde(default)]
    error: Option<BridgeError>,
}

/// Runs Prettier through Node.js
#[derive(Debug, Clone)]
pub struct NodeBridge {
    program: PathBuf,
    args: Vec<String>,
    prettier_module: Option<String>,
}

impl Default for NodeBridge {
    fn default() -> Self {
        Self::new("node")
    }
}

impl NodeBridge {
    /// Use `program` (usually `node`) with the built-in bridge script
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec!["-e".to_string(), BRIDGE_SCRIPT.to_string()],
            prettier_module: None,
        }
    }

    /// Use a custom command speaking the bridge protocol
    pub fn with_command(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            prettier_module: None,
        }
    }

    /// Import Prettier from a specific module path or specifier
    #[must_use]
    pub fn prettier_module(mut self, module: impl Into<String>) -> Self {
        self.prettier_module = Some(module.into());
        self
    }

    fn run(&self, input: &[u8]) -> Result<Vec<u8>, EngineError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(module) = &self.prettier_module {
            command.env("PRETTIFY_PRETTIER", module);
        }

        let mut child = command.spawn().map_err(|source| EngineError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() && output.stdout.is_empty() {
            return Err(EngineError::Protocol(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Offsets in `options` re-expressed as JavaScript string indices into `code`
fn to_js_offsets(code: &str, options: &CursorOptions) -> CursorOptions {
    let mut options = options.clone();
    let to_js = |offset: usize| char_to_utf16_offset(code, offset);
    options.cursor_offset = options.cursor_offset.map(to_js);
    options.options.range_start = options.options.range_start.map(to_js);
    options.options.range_end = options.options.range_end.map(to_js);
    options
}

fn from_js_offsets(result: FormatResult) -> FormatResult {
    match result {
        FormatResult::WithCursor {
            formatted,
            cursor_offset,
        } => FormatResult::WithCursor {
            cursor_offset: utf16_to_char_offset(&formatted, cursor_offset),
            formatted,
        },
        plain @ FormatResult::Plain(_) => plain,
    }
}

impl Formatter for NodeBridge {
    fn format(&self, request: &FormatRequest) -> Result<FormatResult, EngineError> {
        let options = to_js_offsets(&request.code, &request.options);
        let input = serde_json::to_vec(&BridgeInput {
            code: &request.code,
            options: &options,
            is_selection: request.is_selection,
        })
        .map_err(|e| EngineError::Protocol(e.to_string()))?;

        let stdout = self.run(&input)?;
        let output: BridgeOutput = serde_json::from_slice(&stdout).map_err(|e| {
            EngineError::Protocol(format!("{e}: {}", String::from_utf8_lossy(&stdout).trim()))
        })?;

        match output {
            BridgeOutput { error: Some(error), .. } => Err(EngineError::format(error.message)),
            BridgeOutput { ok: Some(result), .. } => Ok(from_js_offsets(result)),
            _ => Err(EngineError::Protocol("empty reply".to_string())),
        }
    }
}

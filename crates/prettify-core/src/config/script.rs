//! Static reading of `.prettierrc.js`-style configs
//!
//! Script configs are never executed. The exported value must be an object
//! literal that parses as JSON5: strings, numbers, booleans, arrays and
//! nested objects, with comments, unquoted keys and trailing commas allowed.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::options::FormatOptions;

fn export_regex() -> Option<&'static Regex> {
    static EXPORT: OnceLock<Option<Regex>> = OnceLock::new();
    EXPORT
        .get_or_init(|| {
            Regex::new(r"(?m)^\s*(?:export\s+default\s+(?:const\s+[A-Za-z_$][\w$]*\s*=\s*)?|module\.exports\s*=\s*)").ok()
        })
        .as_ref()
}

fn identifier_regex() -> Option<&'static Regex> {
    static IDENT: OnceLock<Option<Regex>> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_$][\w$]*").ok()).as_ref()
}

/// Read the exported options object out of a script config
pub(crate) fn evaluate(text: &str) -> Result<FormatOptions, String> {
    let exported = export_regex()
        .and_then(|re| re.find(text))
        .ok_or_else(|| "no `export default` or `module.exports` found".to_string())?;
    let mut expression = text[exported.end()..].trim_start();

    // `export default config;` refers to a binding declared elsewhere
    if let Some(name) = identifier_regex().and_then(|re| re.find(expression)) {
        let binding = Regex::new(&format!(r"(?m)^\s*(?:const|let|var)\s+{}\s*=\s*", regex::escape(name.as_str())))
            .map_err(|e| e.to_string())?;
        let declared = binding
            .find(text)
            .ok_or_else(|| format!("exported value `{}` is not an object literal", name.as_str()))?;
        expression = text[declared.end()..].trim_start();
    }

    let literal = object_literal(expression)?;
    let value: Value = json5::from_str(literal).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("exported value is not an object literal".to_string());
    }
    serde_json::from_value(integral_numbers(value)).map_err(|e| e.to_string())
}

/// JS has one number type; `100.0` is the integer `100`
#[allow(clippy::cast_possible_truncation)]
fn integral_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) if !n.is_i64() && !n.is_u64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(integral_numbers).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, integral_numbers(v))).collect()),
        other => other,
    }
}

/// The balanced `{ ... }` at the start of `expression`, skipping brackets
/// inside strings and comments
fn object_literal(expression: &str) -> Result<&str, String> {
    if !expression.starts_with('{') {
        return Err("exported value is not an object literal".to_string());
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = expression.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match (c, chars.peek().map(|&(_, next)| next)) {
            ('/', Some('/')) => {
                while chars.next_if(|&(_, ch)| ch != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = ' ';
                for (_, ch) in chars.by_ref() {
                    if previous == '*' && ch == '/' {
                        break;
                    }
                    previous = ch;
                }
            }
            ('"' | '\'' | '`', _) => quote = Some(c),
            ('{' | '[', _) => depth += 1,
            ('}' | ']', _) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(&expression[..=index]);
                }
            }
            _ => {}
        }
    }

    Err("unterminated object literal".to_string())
}

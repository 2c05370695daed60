//! Parser inference from file names

/// Extensions the integration registers itself as formatter for
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "html",
    "htm",
    "css",
    "scss",
    "less",
    "js",
    "cjs",
    "es",
    "mjs",
    "jsx",
    "ts",
    "tsx",
    "vue",
    "json",
    "hbs",
    "handlebars",
    "md",
    "yaml",
    "yml",
];

fn extension(filename: &str) -> &str {
    filename.rfind('.').map_or(filename, |dot| &filename[dot + 1..])
}

/// Infer the Prettier parser for a file name
///
/// Unknown extensions pass through unchanged; the engine decides whether it
/// knows a parser by that name.
pub fn infer_parser(filename: &str) -> String {
    let parser = match extension(filename) {
        "html" | "htm" => "html",
        "js" | "cjs" | "es" | "mjs" | "jsx" => "babel",
        "ts" | "tsx" => "typescript",
        "hbs" | "handlebars" => "glimmer",
        "md" => "markdown",
        "yaml" | "yml" => "yaml",
        other => other,
    };
    parser.to_string()
}

/// Returns true if the file's extension is one the integration formats
pub fn is_supported(filename: &str) -> bool {
    filename.contains('.') && SUPPORTED_EXTENSIONS.contains(&extension(filename))
}

//! Project configuration discovery
//!
//! A config file is looked up in a single search root: the nearest open
//! project folder enclosing the file being formatted, or the file's own
//! directory. Within that root the first existing name in [`CONFIG_FILES`]
//! wins. Parent directories are not searched.

mod script;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::task::JoinSet;

use crate::options::FormatOptions;

/// Config file names in priority order
pub const CONFIG_FILES: &[&str] = &[
    ".prettierrc",
    ".prettierrc.json",
    ".prettierrc.yaml",
    ".prettierrc.yml",
    ".prettierrc.toml",
    ".prettierrc.js",
    ".prettier.config.js",
    ".prettierrc.mjs",
    ".prettierrc.config.mjs",
    ".prettierrc.cjs",
    ".prettierrc.config.cjs",
];

/// Errors that can occur while reading a project config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{} does not export a plain object literal: {reason}", path.display())]
    ScriptNotStatic { path: PathBuf, reason: String },

    #[error("cannot resolve config for {} by blocking inside an async runtime", path.display())]
    InsideRuntime { path: PathBuf },
}

impl ConfigError {
    /// The config file the error refers to
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Json { path, .. }
            | Self::Yaml { path, .. }
            | Self::Toml { path, .. }
            | Self::ScriptNotStatic { path, .. }
            | Self::InsideRuntime { path } => path,
        }
    }
}

/// How a config file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
    /// `.js`/`.mjs`/`.cjs` module; read as data, never executed
    Script,
}

impl ConfigFormat {
    /// Format for one of the [`CONFIG_FILES`] names
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            ".prettierrc" | ".prettierrc.json" => Some(Self::Json),
            ".prettierrc.yaml" | ".prettierrc.yml" => Some(Self::Yaml),
            ".prettierrc.toml" => Some(Self::Toml),
            ".prettierrc.js"
            | ".prettier.config.js"
            | ".prettierrc.mjs"
            | ".prettierrc.config.mjs"
            | ".prettierrc.cjs"
            | ".prettierrc.config.cjs" => Some(Self::Script),
            _ => None,
        }
    }
}

/// A discovered and parsed project config
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub path: PathBuf,
    pub format: ConfigFormat,
    pub options: FormatOptions,
}

/// Pick the directory searched for a config file
///
/// The deepest project folder enclosing `file_path` wins; without one, the
/// file's parent directory is used.
pub fn search_root(file_path: &Path, project_folders: &[PathBuf]) -> PathBuf {
    project_folders
        .iter()
        .filter(|folder| file_path.starts_with(folder))
        .max_by_key(|folder| folder.components().count())
        .cloned()
        .unwrap_or_else(|| file_path.parent().map(Path::to_path_buf).unwrap_or_default())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

/// Find the highest-priority config file in `root`
///
/// Existence checks run concurrently; priority follows [`CONFIG_FILES`]
/// order, not completion order.
pub async fn find_config_file(root: &Path) -> Option<PathBuf> {
    let mut probes = JoinSet::new();
    for (priority, name) in CONFIG_FILES.iter().enumerate() {
        let candidate = root.join(name);
        probes.spawn(async move { (priority, is_file(&candidate).await) });
    }

    let mut found: Option<usize> = None;
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((priority, true)) => {
                found = Some(found.map_or(priority, |best| best.min(priority)));
            }
            Ok((_, false)) => {}
            Err(e) => tracing::warn!("config probe task failed: {}", e),
        }
    }

    found.map(|priority| root.join(CONFIG_FILES[priority]))
}

/// Parse config text according to its format
pub fn parse_config(path: &Path, format: ConfigFormat, text: &str) -> Result<FormatOptions, ConfigError> {
    match format {
        ConfigFormat::Json => serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Toml => toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Script => script::evaluate(text).map_err(|reason| ConfigError::ScriptNotStatic {
            path: path.to_path_buf(),
            reason,
        }),
    }
}

/// Resolve the project config for a file
///
/// Returns `Ok(None)` when no config file exists, in which case the caller
/// uses its persisted defaults. A config that exists but cannot be read or
/// parsed is an error; it never silently falls back to defaults.
pub async fn resolve_config(
    file_path: &Path,
    project_folders: &[PathBuf],
) -> Result<Option<ResolvedConfig>, ConfigError> {
    let root = search_root(file_path, project_folders);
    let Some(path) = find_config_file(&root).await else {
        tracing::debug!("no prettier config in {}", root.display());
        return Ok(None);
    };

    let format = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(ConfigFormat::from_file_name)
        .unwrap_or(ConfigFormat::Json);

    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
    let options = parse_config(&path, format, &text)?;
    tracing::debug!("using prettier config {}", path.display());

    Ok(Some(ResolvedConfig { path, format, options }))
}

/// Blocking wrapper around [`resolve_config`] for hosts without a runtime
///
/// Called from inside a tokio runtime it returns
/// [`ConfigError::InsideRuntime`]; await [`resolve_config`] there instead.
pub fn resolve_config_blocking(
    file_path: &Path,
    project_folders: &[PathBuf],
) -> Result<Option<ResolvedConfig>, ConfigError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ConfigError::InsideRuntime {
            path: file_path.to_path_buf(),
        });
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| ConfigError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
    runtime.block_on(resolve_config(file_path, project_folders))
}

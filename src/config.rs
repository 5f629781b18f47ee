//! Engine configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--log-level`, etc.)
//! 2. `$PTREE_CONFIG` environment variable (path to config file)
//! 3. Project-local `.ptree.toml` in the current working directory
//! 4. Global `~/.config/ptree/config.toml`
//! 5. Built-in defaults

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fs::watcher::DEFAULT_DEBOUNCE_MS;
use crate::loader::DEFAULT_MAX_CONCURRENT_LISTINGS;

// ── Section configs ──────────────────────────────────────────────────────────

/// Directory loading settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory listings allowed in flight at once.
    pub max_concurrent_listings: Option<usize>,
    /// Entry names skipped while loading and watching (e.g. ".git").
    pub ignore: Option<Vec<String>>,
}

/// MIME classification settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MimeConfig {
    /// Extension → MIME type overrides.
    pub overrides: Option<HashMap<String, String>>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Keep the tree in sync with the filesystem.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, e.g. "info" or "project_tree=debug".
    pub filter: Option<String>,
}

/// Text rendering settings for the command-line host.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ViewConfig {
    /// Box-drawing characters (false = ASCII fallback).
    pub use_unicode: Option<bool>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub mime: MimeConfig,
    pub watcher: WatcherConfig,
    pub logging: LoggingConfig,
    pub view: ViewConfig,
}

/// A merged config plus warnings for files that failed to read or parse.
///
/// Config is read before logging is installed, so warnings are handed back
/// for the caller to emit once it is.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub warnings: Vec<String>,
}

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. $PTREE_CONFIG environment variable
    if let Ok(env_path) = std::env::var("PTREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    // 2. Project-local `.ptree.toml` in CWD
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".ptree.toml"));
    }

    // 3. Global `~/.config/ptree/config.toml`
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("ptree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file.
///
/// `Ok(None)` if the file doesn't exist, `Err` with a message if it exists
/// but can't be read or doesn't parse.
fn load_file(path: &Path) -> Result<Option<AppConfig>, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        }
    };
    toml::from_str::<AppConfig>(&content)
        .map(Some)
        .map_err(|e| format!("failed to parse config file {}: {}", path.display(), e))
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            loader: LoaderConfig {
                max_concurrent_listings: other
                    .loader
                    .max_concurrent_listings
                    .or(self.loader.max_concurrent_listings),
                ignore: other.loader.ignore.clone().or(self.loader.ignore),
            },
            mime: MimeConfig {
                overrides: match (self.mime.overrides, &other.mime.overrides) {
                    (Some(mut base), Some(over)) => {
                        base.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
                        Some(base)
                    }
                    (base, None) => base,
                    (None, Some(over)) => Some(over.clone()),
                },
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
            logging: LoggingConfig {
                filter: other.logging.filter.clone().or(self.logging.filter),
            },
            view: ViewConfig {
                use_unicode: other.view.use_unicode.or(self.view.use_unicode),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> LoadedConfig {
        let mut paths = candidate_paths();
        paths.reverse();
        if let Some(cli_path) = cli_config_path {
            paths.push(cli_path.to_path_buf());
        }
        Self::load_from(&paths, cli_overrides)
    }

    /// Merge files in `paths` (lowest priority first), then `cli_overrides`.
    fn load_from(paths: &[PathBuf], cli_overrides: Option<&AppConfig>) -> LoadedConfig {
        let mut loaded = LoadedConfig::default();

        for path in paths {
            match load_file(path) {
                Ok(Some(file_cfg)) => loaded.config = loaded.config.merge(&file_cfg),
                Ok(None) => {}
                Err(warning) => loaded.warnings.push(warning),
            }
        }

        // CLI flag overrides are highest priority.
        if let Some(overrides) = cli_overrides {
            loaded.config = loaded.config.merge(overrides);
        }

        loaded
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Directory listings allowed in flight at once.
    pub fn max_concurrent_listings(&self) -> usize {
        self.loader
            .max_concurrent_listings
            .unwrap_or(DEFAULT_MAX_CONCURRENT_LISTINGS)
    }

    /// Entry names to skip.
    pub fn ignore_names(&self) -> Vec<String> {
        self.loader.ignore.clone().unwrap_or_default()
    }

    /// Extension → MIME overrides.
    pub fn mime_overrides(&self) -> HashMap<String, String> {
        self.mime.overrides.clone().unwrap_or_default()
    }

    /// Whether the watcher is enabled.
    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(false)
    }

    /// Watcher debounce interval in milliseconds.
    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// Log filter directive from the config file, if any.
    pub fn log_filter(&self) -> Option<&str> {
        self.logging.filter.as_deref()
    }

    /// Whether to draw the tree with box-drawing characters.
    pub fn use_unicode(&self) -> bool {
        self.view.use_unicode.unwrap_or(true)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

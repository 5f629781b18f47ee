use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default flood threshold (events per debounce window).
pub const DEFAULT_FLOOD_THRESHOLD: usize = 100;

/// Filesystem watcher that monitors a project root and reports changed paths.
pub struct FsWatcher {
    /// Handle to the debouncer (dropped to stop watching).
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl FsWatcher {
    /// Create a new FsWatcher that watches `root` recursively.
    ///
    /// Events are debounced by `debounce_duration` and sent via `changes_tx`.
    /// Paths with a component listed in `ignore_names` are dropped.
    /// If more than `flood_threshold` paths arrive in a single debounce window,
    /// they are collapsed into the root path alone.
    pub fn new(
        root: &Path,
        debounce_duration: Duration,
        ignore_names: Vec<String>,
        flood_threshold: usize,
        changes_tx: mpsc::UnboundedSender<Vec<PathBuf>>,
    ) -> notify::Result<Self> {
        let root_path = root.to_path_buf();

        let mut debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                match result {
                    Ok(events) => {
                        let paths: Vec<PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path.clone())
                            .filter(|p| !should_ignore(p, &ignore_names))
                            .collect();

                        if let Some(paths) = collapse_flood(paths, flood_threshold, &root_path) {
                            let _ = changes_tx.send(paths);
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "filesystem watcher error");
                    }
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(root, notify::RecursiveMode::Recursive)?;

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

/// Drop empty batches and replace oversized ones with a root refresh.
fn collapse_flood(paths: Vec<PathBuf>, flood_threshold: usize, root: &Path) -> Option<Vec<PathBuf>> {
    if paths.is_empty() {
        return None;
    }
    if paths.len() > flood_threshold {
        tracing::debug!(count = paths.len(), "change flood, refreshing root");
        return Some(vec![root.to_path_buf()]);
    }
    Some(paths)
}

/// Check if a path should be ignored.
///
/// A path is ignored if any of its components matches a name exactly.
pub fn should_ignore(path: &Path, names: &[String]) -> bool {
    path.components().any(|component| match component {
        std::path::Component::Normal(name) => {
            let name = name.to_string_lossy();
            names.iter().any(|n| n.as_str() == name.as_ref())
        }
        _ => false,
    })
}

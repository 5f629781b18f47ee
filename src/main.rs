use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use project_tree::config::{AppConfig, WatcherConfig};
use project_tree::error::{Result, TreeError};
use project_tree::fs::watcher::DEFAULT_FLOOD_THRESHOLD;
use project_tree::fs::{ExtensionTable, FsSource, FsWatcher};
use project_tree::tree::rows::render_text;
use project_tree::tree::{Glyphs, NodeId, TreeObserver, TreeStore};
use project_tree::{logging, DirectoryLoader, SelectionController};

/// Print a project directory as an expandable tree.
#[derive(Parser, Debug)]
#[command(name = "ptree", version, about)]
struct Cli {
    /// Root path to display (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to a config file (overrides the default search)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Select a node by id and expand its ancestors (relative ids are joined to the root)
    #[arg(long)]
    reveal: Option<String>,

    /// Expand every directory before printing
    #[arg(long)]
    expand_all: bool,

    /// Print the tree as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Keep running and reprint on filesystem changes
    #[arg(long)]
    watch: bool,

    /// Log filter directive (e.g. "debug", "project_tree=trace")
    #[arg(long)]
    log_level: Option<String>,
}

/// Logs store notifications.
struct TraceObserver;

impl TreeObserver for TraceObserver {
    fn on_tree_changed(&mut self) {
        tracing::debug!("tree changed");
    }

    fn on_selection_changed(&mut self, node: NodeId, is_toggle: bool) {
        tracing::debug!(?node, is_toggle, "selection changed");
    }
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(%error, "ptree failed");
        eprintln!("ptree: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let cli_overrides = AppConfig {
        watcher: WatcherConfig {
            enabled: cli.watch.then_some(true),
            ..Default::default()
        },
        ..Default::default()
    };
    let loaded = AppConfig::load(cli.config.as_deref(), Some(&cli_overrides));
    let config = loaded.config;

    logging::init(cli.log_level.as_deref(), config.log_filter());
    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    let root = cli
        .path
        .canonicalize()
        .map_err(|source| TreeError::RootUnreadable {
            path: cli.path.clone(),
            source,
        })?;

    let loader = DirectoryLoader::new(FsSource)
        .with_mime(ExtensionTable::with_overrides(config.mime_overrides()))
        .with_max_concurrent(config.max_concurrent_listings())
        .with_ignore(config.ignore_names());

    let loaded_tree = loader.load(&root).await?;
    for failure in &loaded_tree.failures {
        tracing::warn!(path = %failure.path.display(), reason = %failure.reason, "subtree not loaded");
    }
    let mut store = loaded_tree.store;
    store.set_observer(TraceObserver);

    let mut selection = SelectionController::new();
    if cli.expand_all {
        store.expand_all();
    }
    if let Some(id) = cli.reveal.as_deref() {
        reveal(&mut store, &mut selection, &root, id);
    }
    store.flush();

    let glyphs = if config.use_unicode() {
        Glyphs::UNICODE
    } else {
        Glyphs::ASCII
    };
    print_tree(&store, &glyphs, cli.json)?;

    if !config.watcher_enabled() {
        return Ok(());
    }

    let (changes_tx, mut changes_rx) = mpsc::unbounded_channel();
    let _watcher = FsWatcher::new(
        &root,
        Duration::from_millis(config.debounce_ms()),
        config.ignore_names(),
        DEFAULT_FLOOD_THRESHOLD,
        changes_tx,
    )?;
    tracing::info!(root = %root.display(), "watching for changes");

    loop {
        tokio::select! {
            changed = changes_rx.recv() => {
                let Some(paths) = changed else { break };
                for failure in loader.resync(&mut store, &paths).await {
                    tracing::warn!(path = %failure.path.display(), reason = %failure.reason, "subtree not reloaded");
                }
                if store.flush() {
                    print_tree(&store, &glyphs, cli.json)?;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Select `id` and open the directories above it.
fn reveal(store: &mut TreeStore, selection: &mut SelectionController, root: &Path, id: &str) {
    let full_id = if Path::new(id).is_absolute() {
        id.to_string()
    } else {
        root.join(id).to_string_lossy().to_string()
    };
    match selection.reveal(store, &full_id) {
        Some(node) => store.expand_ancestors(node),
        None => tracing::warn!(id = %full_id, "reveal target not found"),
    }
}

fn print_tree(store: &TreeStore, glyphs: &Glyphs, json: bool) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if json {
        let snapshot = store.snapshot();
        serde_json::to_writer_pretty(&mut stdout, &snapshot)?;
        writeln!(stdout)?;
    } else {
        write!(stdout, "{}", render_text(store, glyphs))?;
    }
    stdout.flush()?;
    Ok(())
}

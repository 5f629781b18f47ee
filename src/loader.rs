//! Asynchronous, recursive population of a `TreeStore` from a `DataSource`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{self, JoinSet};

use crate::error::{Result, TreeError};
use crate::fs::{DataSource, DirEntry, ExtensionTable, MimeResolver};
use crate::tree::{Expansion, InsertRequest, NodeId, Selection, TreeNode, TreeStore};

/// Default number of directory listings allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_LISTINGS: usize = 16;

/// A directory that could not be listed. Its node stays in the tree with no
/// children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a successful load: the tree plus every subtree that failed.
#[derive(Debug)]
pub struct LoadedTree {
    pub store: TreeStore,
    pub failures: Vec<SubtreeFailure>,
}

/// Outcome of one spawned listing.
type Listing = (NodeId, PathBuf, io::Result<Vec<DirEntry>>);

/// Populates trees from a `DataSource`.
///
/// Listings of different directories run concurrently, but every append is
/// done by the loop that owns the store, one directory's whole listing at a
/// time. Children of a node therefore always appear in the source's
/// enumeration order and two parents never interleave.
pub struct DirectoryLoader<S> {
    source: Arc<S>,
    mime: Arc<dyn MimeResolver>,
    max_concurrent: usize,
    ignore: Vec<String>,
}

impl<S: DataSource> DirectoryLoader<S> {
    pub fn new(source: S) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<S>) -> Self {
        Self {
            source,
            mime: Arc::new(ExtensionTable::new()),
            max_concurrent: DEFAULT_MAX_CONCURRENT_LISTINGS,
            ignore: Vec::new(),
        }
    }

    pub fn with_mime(mut self, resolver: impl MimeResolver + 'static) -> Self {
        self.mime = Arc::new(resolver);
        self
    }

    /// Clamped to at least one.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Entry names skipped during enumeration.
    pub fn with_ignore(mut self, names: Vec<String>) -> Self {
        self.ignore = names;
        self
    }

    /// Build a tree for `root_path`.
    ///
    /// Fails with `RootUnreadable` only when the root itself cannot be
    /// listed. Any deeper failure is logged and recorded in
    /// `LoadedTree::failures`.
    pub async fn load(&self, root_path: impl AsRef<Path>) -> Result<LoadedTree> {
        let root_path = root_path.as_ref().to_path_buf();
        tracing::debug!(root = %root_path.display(), "loading project tree");

        let entries = self.source.list_entries(&root_path).await.map_err(|source| {
            tracing::error!(path = %root_path.display(), error = %source, "root unreadable");
            TreeError::RootUnreadable {
                path: root_path.clone(),
                source,
            }
        })?;

        let mut store = TreeStore::new(&root_path);
        let root = store.root();
        let pending = self.append_listing(&mut store, root, &root_path, entries);
        let mut failures = Vec::new();
        self.drain(&mut store, pending, &mut failures).await;

        tracing::debug!(
            nodes = store.node_count(),
            failures = failures.len(),
            "project tree loaded"
        );
        Ok(LoadedTree { store, failures })
    }

    /// Discard `node`'s descendants and list it again.
    ///
    /// Expansion and selection of nodes whose ids survive the reload are
    /// restored. Fails with `InvalidParent` if `node` is not a directory.
    pub async fn reload_subtree(
        &self,
        store: &mut TreeStore,
        node: NodeId,
    ) -> Result<Vec<SubtreeFailure>> {
        match store.node(node) {
            Some(n) if n.is_directory() => {}
            _ => return Err(TreeError::InvalidParent(node)),
        }
        let path = store
            .source_path(node)
            .ok_or(TreeError::InvalidParent(node))?;
        tracing::debug!(path = %path.display(), "reloading subtree");

        let (expanded, selected) = capture_state(store, node);
        store.clear_children(node);

        let mut failures = Vec::new();
        self.drain(store, VecDeque::from([(node, path)]), &mut failures)
            .await;

        restore_state(store, node, &expanded, selected.as_deref());
        Ok(failures)
    }

    /// Reload the directories affected by a batch of changed paths.
    ///
    /// Each path maps to its nearest loaded directory ancestor; a change to
    /// the root path reloads the whole tree. Paths outside the root are
    /// ignored.
    pub async fn resync(&self, store: &mut TreeStore, changed: &[PathBuf]) -> Vec<SubtreeFailure> {
        let mut targets: Vec<NodeId> = Vec::new();
        for path in changed {
            if let Some(target) = reload_target(store, path) {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }

        // A reload of an ancestor already covers its descendants.
        let covered: Vec<NodeId> = targets
            .iter()
            .copied()
            .filter(|t| !targets.iter().any(|other| other != t && is_ancestor(store, *other, *t)))
            .collect();

        let mut failures = Vec::new();
        for target in covered {
            match self.reload_subtree(store, target).await {
                Ok(mut f) => failures.append(&mut f),
                Err(error) => tracing::warn!(%error, "resync skipped a target"),
            }
        }
        failures
    }

    /// Read `path` through the data source and insert it as a file node.
    pub async fn insert_from_source(
        &self,
        store: &mut TreeStore,
        path: impl AsRef<Path>,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let path = path.as_ref();
        let content = self.source.read_content(path).await?;
        let mut request = InsertRequest::new(path.to_string_lossy().to_string(), content);
        request.parent = parent;
        request.mime_type = path
            .extension()
            .and_then(|ext| self.mime.lookup(&ext.to_string_lossy()));
        store.insert(request)
    }

    /// Run listings for `pending` and everything discovered beneath them.
    async fn drain(
        &self,
        store: &mut TreeStore,
        mut pending: VecDeque<(NodeId, PathBuf)>,
        failures: &mut Vec<SubtreeFailure>,
    ) {
        let mut in_flight: JoinSet<Listing> = JoinSet::new();
        let mut spawned: HashMap<task::Id, PathBuf> = HashMap::new();

        loop {
            while in_flight.len() < self.max_concurrent {
                let Some((node, path)) = pending.pop_front() else {
                    break;
                };
                let source = Arc::clone(&self.source);
                let task_path = path.clone();
                let handle = in_flight.spawn(async move {
                    let listing = source.list_entries(&task_path).await;
                    (node, task_path, listing)
                });
                spawned.insert(handle.id(), path);
            }

            let Some(joined) = in_flight.join_next_with_id().await else {
                break;
            };

            match joined {
                Ok((id, (node, path, Ok(entries)))) => {
                    spawned.remove(&id);
                    let discovered = self.append_listing(store, node, &path, entries);
                    pending.extend(discovered);
                }
                Ok((id, (_, path, Err(error)))) => {
                    spawned.remove(&id);
                    tracing::warn!(path = %path.display(), %error, "subtree unreadable");
                    failures.push(SubtreeFailure {
                        path,
                        reason: error.to_string(),
                    });
                }
                Err(error) => {
                    // The node stays in the tree with no children.
                    let Some(path) = spawned.remove(&error.id()) else {
                        tracing::error!(%error, "unknown directory listing task failed");
                        continue;
                    };
                    tracing::error!(path = %path.display(), %error, "directory listing task failed");
                    failures.push(SubtreeFailure {
                        path,
                        reason: error.to_string(),
                    });
                }
            }
        }
    }

    /// Append one directory's entries in order; returns the subdirectories
    /// still to be listed.
    fn append_listing(
        &self,
        store: &mut TreeStore,
        parent: NodeId,
        parent_path: &Path,
        entries: Vec<DirEntry>,
    ) -> VecDeque<(NodeId, PathBuf)> {
        let mut subdirs = VecDeque::new();
        for entry in entries {
            if self.ignore.iter().any(|name| *name == entry.name) {
                continue;
            }
            let path = parent_path.join(&entry.name);
            let id = path.to_string_lossy().to_string();
            let node = if entry.is_dir {
                TreeNode::directory(id, entry.name)
            } else {
                let mime = entry
                    .extension
                    .as_deref()
                    .and_then(|ext| self.mime.lookup(ext));
                TreeNode::file(id, entry.name, mime)
            };

            match store.append_child(parent, node) {
                Ok(child) if entry.is_dir => subdirs.push_back((child, path)),
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "dropped entry");
                }
            }
        }
        subdirs
    }
}

fn capture_state(store: &TreeStore, node: NodeId) -> (HashSet<String>, Option<String>) {
    let mut expanded = HashSet::new();
    let mut selected = None;
    for id in store.descendants(node) {
        if id == node {
            continue;
        }
        let Some(n) = store.node(id) else {
            continue;
        };
        if n.expansion().is_expanded() {
            expanded.insert(n.id().to_string());
        }
        if n.selection().is_selected() {
            selected = Some(n.id().to_string());
        }
    }
    (expanded, selected)
}

fn restore_state(
    store: &mut TreeStore,
    node: NodeId,
    expanded: &HashSet<String>,
    selected: Option<&str>,
) {
    for id in store.descendants(node) {
        if id == node {
            continue;
        }
        let Some(n) = store.node(id) else {
            continue;
        };
        let key = n.id().to_string();
        let disabled = n.is_disabled();
        if expanded.contains(&key) {
            store.set_expansion(id, Expansion::Expanded);
        }
        if selected == Some(key.as_str()) && !disabled {
            store.set_selection(id, Selection::Selected);
        }
    }
}

/// Nearest loaded directory that should be re-listed for a change at `path`.
fn reload_target(store: &TreeStore, path: &Path) -> Option<NodeId> {
    let root_path = store.root_path();
    if path == root_path {
        return Some(store.root());
    }
    if !path.starts_with(root_path) {
        return None;
    }
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == root_path {
            return Some(store.root());
        }
        if let Some(id) = store.find_by_id(&dir.to_string_lossy()) {
            if store.node(id).is_some_and(|n| n.is_directory()) {
                return Some(id);
            }
        }
        current = dir.parent();
    }
    None
}

fn is_ancestor(store: &TreeStore, ancestor: NodeId, node: NodeId) -> bool {
    let mut current = store.parent(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = store.parent(id);
    }
    false
}

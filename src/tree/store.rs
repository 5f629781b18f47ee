use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::Serialize;
use slotmap::SlotMap;

use super::node::{label_from_id, Expansion, NodeId, NodeKind, Selection, TreeNode, ROOT_ID};
use super::notify::{NullObserver, TreeObserver};
use crate::error::{Result, TreeError};

/// A new leaf to be inserted into the tree.
#[derive(Debug, Clone, Default)]
pub struct InsertRequest {
    pub id: String,
    /// Display name; defaults to the final segment of `id`.
    pub label: Option<String>,
    pub mime_type: Option<String>,
    pub content: Vec<u8>,
    /// Target parent; `None` means the default project root.
    pub parent: Option<NodeId>,
}

impl InsertRequest {
    pub fn new(id: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            content,
            ..Default::default()
        }
    }

    pub fn under(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Serializable nested view of a subtree.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub expanded: bool,
    pub selected: bool,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

/// Owner of the project tree.
///
/// All nodes live in a flat arena keyed by `NodeId`. Mutations mark the tree
/// as needing a render; `flush` turns any number of pending requests into a
/// single `on_tree_changed` notification.
pub struct TreeStore {
    arena: SlotMap<NodeId, TreeNode>,
    root: NodeId,
    root_path: PathBuf,
    observer: Box<dyn TreeObserver>,
    render_pending: bool,
}

impl std::fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore")
            .field("root_path", &self.root_path)
            .field("nodes", &self.arena.len())
            .field("render_pending", &self.render_pending)
            .finish()
    }
}

impl TreeStore {
    /// Create a store holding only the root node for `root_path`.
    pub fn new(root_path: &Path) -> Self {
        let mut arena = SlotMap::with_key();
        let mut root = TreeNode::directory(ROOT_ID, label_from_id(&root_path.to_string_lossy()));
        root.expansion = Expansion::Expanded;
        let root = arena.insert(root);
        Self {
            arena,
            root,
            root_path: root_path.to_path_buf(),
            observer: Box::new(NullObserver),
            render_pending: false,
        }
    }

    /// Replace the notification sink.
    pub fn set_observer(&mut self, observer: impl TreeObserver + 'static) {
        self.observer = Box::new(observer);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Filesystem path the root node mirrors.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains_key(id)
    }

    /// Children of `id`, empty when the node is a leaf or unknown.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Source path of a node: the root path for the root, the id otherwise.
    pub fn source_path(&self, id: NodeId) -> Option<PathBuf> {
        if id == self.root {
            return Some(self.root_path.clone());
        }
        self.arena.get(id).map(|n| PathBuf::from(n.id()))
    }

    // ── Traversal ────────────────────────────────────────────────────────────

    /// Breadth-first traversal from `roots`.
    ///
    /// Stops at the first `Some` returned by `visitor` and yields it;
    /// `None` once every reachable node has been visited.
    pub fn walk<T>(
        &self,
        roots: &[NodeId],
        mut visitor: impl FnMut(NodeId, &TreeNode) -> Option<T>,
    ) -> Option<T> {
        let mut queue: VecDeque<NodeId> = roots.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            if let Some(found) = visitor(id, node) {
                return Some(found);
            }
            queue.extend(node.children.iter().copied());
        }
        None
    }

    /// First node in breadth-first order matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&TreeNode) -> bool) -> Option<NodeId> {
        self.walk(&[self.root], |id, node| predicate(node).then_some(id))
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find(|node| node.id() == id)
    }

    pub fn find_by_label(&self, label: &str) -> Option<NodeId> {
        self.find(|node| node.label() == label)
    }

    /// The selected node, if any.
    pub fn selected(&self) -> Option<NodeId> {
        self.find(|node| node.selection.is_selected())
    }

    pub fn selected_count(&self) -> usize {
        self.arena
            .values()
            .filter(|node| node.selection.is_selected())
            .count()
    }

    /// Collect every node id under `start` (inclusive) in breadth-first order.
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(&[start], |id, _| {
            out.push(id);
            None::<()>
        });
        out
    }

    // ── State mutation ───────────────────────────────────────────────────────

    /// Deselect every node.
    pub fn reset_selection(&mut self) {
        for node in self.arena.values_mut() {
            node.selection = Selection::NotSelected;
        }
        self.request_render();
    }

    /// Collapse every node that has no children, so leaves that were opened
    /// earlier do not keep a stale expanded state.
    pub fn collapse_empty_leaves(&mut self) {
        for node in self.arena.values_mut() {
            if node.children.is_empty() {
                node.expansion = Expansion::Collapsed;
            }
        }
        self.request_render();
    }

    pub fn set_expansion(&mut self, id: NodeId, expansion: Expansion) {
        if let Some(node) = self.arena.get_mut(id) {
            node.expansion = expansion;
            self.request_render();
        }
    }

    /// Selection changes go through `SelectionController` so the
    /// single-selection invariant holds.
    pub(crate) fn set_selection(&mut self, id: NodeId, selection: Selection) {
        if let Some(node) = self.arena.get_mut(id) {
            node.selection = selection;
            self.request_render();
        }
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) {
        if let Some(node) = self.arena.get_mut(id) {
            node.label = label.into();
            self.request_render();
        }
    }

    /// Disabling a node also drops its selection.
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if let Some(node) = self.arena.get_mut(id) {
            node.disabled = disabled;
            if disabled {
                node.selection = Selection::NotSelected;
            }
            self.request_render();
        }
    }

    /// Expand every ancestor of `id` up to the root. The node itself is left
    /// as is.
    pub fn expand_ancestors(&mut self, id: NodeId) {
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            self.set_expansion(ancestor, Expansion::Expanded);
            current = self.parent(ancestor);
        }
    }

    /// Expand every directory.
    pub fn expand_all(&mut self) {
        for node in self.arena.values_mut() {
            if node.is_directory() {
                node.expansion = Expansion::Expanded;
            }
        }
        self.request_render();
    }

    /// Collapse everything except the root.
    pub fn collapse_all(&mut self) {
        let root = self.root;
        for (id, node) in self.arena.iter_mut() {
            if id != root {
                node.expansion = Expansion::Collapsed;
            }
        }
        self.request_render();
    }

    // ── Structure mutation ───────────────────────────────────────────────────

    /// Append `node` as the last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeId, mut node: TreeNode) -> Result<NodeId> {
        match self.arena.get(parent) {
            Some(p) if p.is_directory() => {}
            _ => return Err(TreeError::InvalidParent(parent)),
        }
        node.parent = Some(parent);
        let child = self.arena.insert(node);
        if let Some(p) = self.arena.get_mut(parent) {
            p.children.push(child);
        }
        self.request_render();
        Ok(child)
    }

    /// Default insert target: the first root child, or the root itself when
    /// nothing has been loaded yet.
    pub fn default_parent(&self) -> NodeId {
        self.children(self.root)
            .first()
            .copied()
            .unwrap_or(self.root)
    }

    /// Insert a new file node carrying `request.content`.
    ///
    /// Fails with `InvalidParent`, leaving the tree untouched, when the target
    /// cannot hold children.
    pub fn insert(&mut self, request: InsertRequest) -> Result<NodeId> {
        let parent = request.parent.unwrap_or_else(|| self.default_parent());
        let label = request
            .label
            .unwrap_or_else(|| label_from_id(&request.id));
        let node = TreeNode::file(request.id, label, request.mime_type).with_content(request.content);
        self.append_child(parent, node)
    }

    /// Drop every descendant of `id`, leaving it with no children.
    pub(crate) fn clear_children(&mut self, id: NodeId) {
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        let mut stack = std::mem::take(&mut node.children);
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.arena.remove(child) {
                stack.extend(removed.children);
            }
        }
        self.request_render();
    }

    // ── Notifications ────────────────────────────────────────────────────────

    /// Mark the tree as needing a render. Repeated requests coalesce.
    pub fn request_render(&mut self) {
        self.render_pending = true;
    }

    pub fn render_pending(&self) -> bool {
        self.render_pending
    }

    /// Deliver one `on_tree_changed` if any render was requested since the
    /// last flush. Returns whether a notification was sent.
    pub fn flush(&mut self) -> bool {
        if !self.render_pending {
            return false;
        }
        self.render_pending = false;
        self.observer.on_tree_changed();
        true
    }

    pub(crate) fn notify_selection_changed(&mut self, id: NodeId, is_toggle: bool) {
        self.observer.on_selection_changed(id, is_toggle);
    }

    // ── Snapshot ─────────────────────────────────────────────────────────────

    /// Nested copy of the whole tree for serialization.
    pub fn snapshot(&self) -> Option<NodeSnapshot> {
        self.snapshot_of(self.root)
    }

    /// Nested copy of the subtree under `id`. Built with an explicit stack,
    /// so depth is not limited by the call stack.
    pub fn snapshot_of(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.arena.get(id)?;
        let mut stack: Vec<(NodeSnapshot, &[NodeId], usize)> =
            vec![(Self::shallow_snapshot(node), node.children.as_slice(), 0)];

        loop {
            let (_, children, next) = stack.last_mut()?;
            if let Some(&child) = children.get(*next) {
                *next += 1;
                if let Some(child_node) = self.arena.get(child) {
                    stack.push((
                        Self::shallow_snapshot(child_node),
                        child_node.children.as_slice(),
                        0,
                    ));
                }
                continue;
            }

            let (done, _, _) = stack.pop()?;
            match stack.last_mut() {
                Some((parent, _, _)) => parent.children.push(done),
                None => return Some(done),
            }
        }
    }

    fn shallow_snapshot(node: &TreeNode) -> NodeSnapshot {
        NodeSnapshot {
            id: node.id().to_string(),
            label: node.label().to_string(),
            kind: node.kind(),
            mime_type: node.mime_type().map(str::to_string),
            expanded: node.expansion.is_expanded(),
            selected: node.selection.is_selected(),
            disabled: node.disabled,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::notify::{Recorded, RecordingObserver};
    use crate::tree::sample_tree;

    #[test]
    fn new_store_has_expanded_root_only() {
        let store = TreeStore::new(Path::new("/proj"));
        let root = store.node(store.root()).unwrap();
        assert_eq!(root.id(), ROOT_ID);
        assert_eq!(root.label(), "proj");
        assert!(root.expansion().is_expanded());
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn walk_is_breadth_first() {
        let store = sample_tree();
        let mut labels = Vec::new();
        store.walk(&[store.root()], |_, node| {
            labels.push(node.label().to_string());
            None::<()>
        });
        assert_eq!(
            labels,
            vec!["/", "proj", "notes.txt", "src", "README.md", "main", "mod.rs"]
        );
    }

    #[test]
    fn walk_stops_at_first_result() {
        let store = sample_tree();
        let mut visited = 0;
        let found = store.walk(&[store.root()], |_, node| {
            visited += 1;
            (node.label() == "notes.txt").then(|| node.id().to_string())
        });
        assert_eq!(found.as_deref(), Some("/notes.txt"));
        assert_eq!(visited, 3);
    }

    #[test]
    fn walk_over_multiple_roots() {
        let store = sample_tree();
        let src = store.find_by_id("/proj/src").unwrap();
        let notes = store.find_by_id("/notes.txt").unwrap();
        let ids = {
            let mut ids = Vec::new();
            store.walk(&[notes, src], |id, _| {
                ids.push(id);
                None::<()>
            });
            ids
        };
        assert_eq!(ids[0], notes);
        assert_eq!(ids[1], src);
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn find_by_id_and_label() {
        let store = sample_tree();
        let main = store.find_by_id("/proj/src/main").unwrap();
        assert_eq!(store.node(main).unwrap().label(), "main");
        assert_eq!(store.find_by_label("main"), Some(main));
        assert!(store.find_by_id("/nope").is_none());
        assert!(store.find_by_label("nope").is_none());
    }

    #[test]
    fn reset_selection_clears_everything() {
        let mut store = sample_tree();
        for id in store.descendants(store.root()) {
            store.set_selection(id, Selection::Selected);
        }
        assert!(store.selected_count() > 1);
        store.reset_selection();
        assert_eq!(store.selected_count(), 0);
        assert!(store.selected().is_none());
    }

    #[test]
    fn collapse_empty_leaves_keeps_branches_open() {
        let mut store = sample_tree();
        let src = store.find_by_id("/proj/src").unwrap();
        let readme = store.find_by_id("/proj/README.md").unwrap();
        store.set_expansion(src, Expansion::Expanded);
        store.set_expansion(readme, Expansion::Expanded);

        store.collapse_empty_leaves();

        assert!(store.node(src).unwrap().expansion().is_expanded());
        assert_eq!(store.node(readme).unwrap().expansion(), Expansion::Collapsed);
    }

    #[test]
    fn insert_defaults_to_first_root_child() {
        let mut store = sample_tree();
        let proj = store.find_by_id("/proj").unwrap();
        let before = store.children(proj).len();

        let id = store
            .insert(InsertRequest::new("/proj/new.rs", b"fn main() {}".to_vec()))
            .unwrap();

        assert_eq!(store.children(proj).len(), before + 1);
        assert_eq!(store.children(proj).last(), Some(&id));
        let node = store.node(id).unwrap();
        assert_eq!(node.label(), "new.rs");
        assert_eq!(node.kind(), NodeKind::File);
        assert_eq!(node.content(), Some(&b"fn main() {}"[..]));
        assert_eq!(node.parent(), Some(proj));
    }

    #[test]
    fn insert_into_empty_tree_targets_root() {
        let mut store = TreeStore::new(Path::new("/empty"));
        let id = store.insert(InsertRequest::new("/empty/a", Vec::new())).unwrap();
        assert_eq!(store.children(store.root()), &[id]);
    }

    #[test]
    fn insert_under_explicit_parent() {
        let mut store = sample_tree();
        let main = store.find_by_id("/proj/src/main").unwrap();
        let id = store
            .insert(
                InsertRequest::new("/proj/src/main/x", vec![1, 2])
                    .under(main)
                    .label("renamed")
                    .mime_type("application/octet-stream"),
            )
            .unwrap();
        let node = store.node(id).unwrap();
        assert_eq!(node.label(), "renamed");
        assert_eq!(node.mime_type(), Some("application/octet-stream"));
        assert_eq!(store.children(main).last(), Some(&id));
    }

    #[test]
    fn insert_on_file_parent_fails_without_mutation() {
        let mut store = sample_tree();
        let readme = store.find_by_id("/proj/README.md").unwrap();
        let count = store.node_count();

        let err = store
            .insert(InsertRequest::new("/proj/README.md/x", Vec::new()).under(readme))
            .unwrap_err();

        assert!(matches!(err, TreeError::InvalidParent(p) if p == readme));
        assert!(store.children(readme).is_empty());
        assert_eq!(store.node_count(), count);
    }

    #[test]
    fn insert_marks_tree_changed() {
        let mut store = sample_tree();
        let observer = RecordingObserver::default();
        store.set_observer(observer.clone());
        store.flush();
        assert!(!store.render_pending());

        store.insert(InsertRequest::new("/proj/z", Vec::new())).unwrap();
        assert!(store.flush());
        assert_eq!(observer.events(), vec![Recorded::TreeChanged]);
    }

    #[test]
    fn render_requests_coalesce() {
        let mut store = sample_tree();
        let observer = RecordingObserver::default();
        store.set_observer(observer.clone());

        store.reset_selection();
        store.collapse_empty_leaves();
        store.expand_all();
        assert!(store.flush());
        assert!(!store.flush());
        assert_eq!(observer.events(), vec![Recorded::TreeChanged]);
    }

    #[test]
    fn clear_children_drops_descendants() {
        let mut store = sample_tree();
        let src = store.find_by_id("/proj/src").unwrap();
        let main = store.find_by_id("/proj/src/main").unwrap();
        let count = store.node_count();

        store.clear_children(src);

        assert!(store.children(src).is_empty());
        assert!(!store.contains(main));
        assert_eq!(store.node_count(), count - 2);
    }

    #[test]
    fn expand_ancestors_leaves_node_itself() {
        let mut store = sample_tree();
        let mod_rs = store.find_by_id("/proj/src/main/mod.rs").unwrap();
        store.expand_ancestors(mod_rs);
        for id in ["/proj", "/proj/src", "/proj/src/main"] {
            let node = store.find_by_id(id).unwrap();
            assert!(store.node(node).unwrap().expansion().is_expanded(), "{id}");
        }
        assert_eq!(store.node(mod_rs).unwrap().expansion(), Expansion::Collapsed);
    }

    #[test]
    fn collapse_all_keeps_root_open() {
        let mut store = sample_tree();
        store.expand_all();
        store.collapse_all();
        assert!(store.node(store.root()).unwrap().expansion().is_expanded());
        let proj = store.find_by_id("/proj").unwrap();
        assert_eq!(store.node(proj).unwrap().expansion(), Expansion::Collapsed);
    }

    #[test]
    fn set_disabled_drops_selection() {
        let mut store = sample_tree();
        let notes = store.find_by_id("/notes.txt").unwrap();
        store.set_selection(notes, Selection::Selected);
        store.set_disabled(notes, true);
        assert!(store.node(notes).unwrap().is_disabled());
        assert_eq!(store.selected_count(), 0);
    }

    #[test]
    fn snapshot_serializes_nested_tree() {
        let store = sample_tree();
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.id, ROOT_ID);
        assert_eq!(snapshot.children.len(), 2);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["children"][0]["label"], "proj");
        assert_eq!(json["children"][0]["kind"], "directory");
        assert_eq!(json["children"][1]["mime_type"], "text/plain");
        assert!(json["children"][1].get("children").is_none());
    }

    #[test]
    fn snapshot_keeps_order_in_deep_chains() {
        let mut store = TreeStore::new(Path::new("/deep"));
        let mut parent = store.root();
        for i in 0..1000 {
            let dir = store
                .append_child(parent, TreeNode::directory(format!("/deep/{i}"), i.to_string()))
                .unwrap();
            store
                .append_child(parent, TreeNode::file(format!("/deep/{i}.txt"), format!("{i}.txt"), None))
                .unwrap();
            parent = dir;
        }

        let snapshot = store.snapshot_of(store.root()).unwrap();
        let mut current = &snapshot;
        let mut depth = 0;
        while let Some(first) = current.children.first() {
            if current.children.len() == 2 {
                assert_eq!(current.children[1].label, format!("{depth}.txt"));
            }
            current = first;
            depth += 1;
        }
        assert_eq!(depth, 1000);
        assert_eq!(current.label, "999");
    }

    #[test]
    fn source_path_of_root_and_child() {
        let store = sample_tree();
        assert_eq!(store.source_path(store.root()), Some(PathBuf::from("/")));
        let src = store.find_by_id("/proj/src").unwrap();
        assert_eq!(store.source_path(src), Some(PathBuf::from("/proj/src")));
    }
}

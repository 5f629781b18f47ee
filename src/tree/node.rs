use std::path::Path;

use serde::Serialize;
use slotmap::new_key_type;

new_key_type! {
    /// Arena key of a node inside one `TreeStore`.
    pub struct NodeId;
}

/// Identifier carried by the tree root, which mirrors no single entry.
pub const ROOT_ID: &str = "root";

/// Type of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Can hold children.
    Directory,
    /// Leaf; never has children.
    File,
}

/// Whether a node's children are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    #[default]
    Collapsed,
    Expanded,
}

impl Expansion {
    /// The opposite state.
    pub fn toggled(self) -> Self {
        match self {
            Expansion::Collapsed => Expansion::Expanded,
            Expansion::Expanded => Expansion::Collapsed,
        }
    }

    pub fn is_expanded(self) -> bool {
        self == Expansion::Expanded
    }
}

/// Whether a node is the current selection target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    NotSelected,
    Selected,
}

impl Selection {
    pub fn is_selected(self) -> bool {
        self == Selection::Selected
    }
}

/// A node in the project tree.
///
/// Nodes live in the owning store's arena. `children` and `parent` hold
/// arena keys, so ownership only flows from the store down and the parent
/// link never keeps anything alive.
#[derive(Debug, Clone)]
pub struct TreeNode {
    id: String,
    pub(super) label: String,
    kind: NodeKind,
    mime_type: Option<String>,
    pub(super) children: Vec<NodeId>,
    pub(super) expansion: Expansion,
    pub(super) selection: Selection,
    pub(super) disabled: bool,
    pub(super) parent: Option<NodeId>,
    content: Option<Vec<u8>>,
}

impl TreeNode {
    fn new(id: String, label: String, kind: NodeKind) -> Self {
        Self {
            id,
            label,
            kind,
            mime_type: None,
            children: Vec::new(),
            expansion: Expansion::Collapsed,
            selection: Selection::NotSelected,
            disabled: false,
            parent: None,
            content: None,
        }
    }

    /// Create a directory node.
    pub fn directory(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id.into(), label.into(), NodeKind::Directory)
    }

    /// Create a file node with an optional MIME classification.
    pub fn file(id: impl Into<String>, label: impl Into<String>, mime_type: Option<String>) -> Self {
        let mut node = Self::new(id.into(), label.into(), NodeKind::File);
        node.mime_type = mime_type;
        node
    }

    /// Attach an in-memory payload. Directories never carry content, so this
    /// is a no-op for them.
    pub fn with_content(mut self, content: Vec<u8>) -> Self {
        if self.kind == NodeKind::File {
            self.content = Some(content);
        }
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn expansion(&self) -> Expansion {
        self.expansion
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }
}

/// Default display label for an id: its final path segment, or the whole id
/// when it has none.
pub fn label_from_id(id: &str) -> String {
    Path::new(id)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_node_defaults() {
        let node = TreeNode::file("/proj/a.txt", "a.txt", Some("text/plain".into()));
        assert_eq!(node.kind(), NodeKind::File);
        assert_eq!(node.expansion(), Expansion::Collapsed);
        assert_eq!(node.selection(), Selection::NotSelected);
        assert_eq!(node.mime_type(), Some("text/plain"));
        assert!(node.children().is_empty());
        assert!(node.parent().is_none());
    }

    #[test]
    fn directories_never_carry_content() {
        let dir = TreeNode::directory("/proj/src", "src").with_content(b"x".to_vec());
        assert!(dir.content().is_none());
        let file = TreeNode::file("/proj/a", "a", None).with_content(b"x".to_vec());
        assert_eq!(file.content(), Some(&b"x"[..]));
    }

    #[test]
    fn expansion_toggle_round_trips() {
        assert_eq!(Expansion::Collapsed.toggled(), Expansion::Expanded);
        assert_eq!(Expansion::Collapsed.toggled().toggled(), Expansion::Collapsed);
    }

    #[test]
    fn label_from_final_segment() {
        assert_eq!(label_from_id("/proj/src/main.rs"), "main.rs");
        assert_eq!(label_from_id("main.rs"), "main.rs");
        assert_eq!(label_from_id("/"), "/");
    }
}

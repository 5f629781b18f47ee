//! In-memory project tree: nodes, the owning store, path addresses and the
//! visible-row projection a view renders from.

pub mod address;
pub mod node;
pub mod notify;
pub mod rows;
pub mod store;

pub use address::PathAddress;
pub use node::{Expansion, NodeId, NodeKind, Selection, TreeNode, ROOT_ID};
pub use notify::{NullObserver, TreeObserver};
pub use rows::{visible_rows, Glyphs, VisibleRow};
pub use store::{InsertRequest, NodeSnapshot, TreeStore};

/// Small fixture shared by the unit tests:
///
/// ```text
/// /
/// ├── proj/
/// │   ├── src/
/// │   │   └── main/
/// │   │       └── mod.rs
/// │   └── README.md
/// └── notes.txt
/// ```
#[cfg(test)]
pub(crate) fn sample_tree() -> TreeStore {
    let mut store = TreeStore::new(std::path::Path::new("/"));
    let root = store.root();
    let proj = store
        .append_child(root, TreeNode::directory("/proj", "proj"))
        .unwrap();
    store
        .append_child(
            root,
            TreeNode::file("/notes.txt", "notes.txt", Some("text/plain".into())),
        )
        .unwrap();
    let src = store
        .append_child(proj, TreeNode::directory("/proj/src", "src"))
        .unwrap();
    store
        .append_child(
            proj,
            TreeNode::file("/proj/README.md", "README.md", Some("text/markdown".into())),
        )
        .unwrap();
    let main = store
        .append_child(src, TreeNode::directory("/proj/src/main", "main"))
        .unwrap();
    store
        .append_child(
            main,
            TreeNode::file("/proj/src/main/mod.rs", "mod.rs", Some("text/x-rust".into())),
        )
        .unwrap();
    store.flush();
    store
}

//! Project tree engine: loads a directory hierarchy into an in-memory tree,
//! addresses nodes by index path, and tracks expansion and selection.

pub mod config;
pub mod error;
pub mod fs;
pub mod loader;
pub mod logging;
pub mod selection;
pub mod tree;

pub use error::{Result, TreeError};
pub use loader::{DirectoryLoader, LoadedTree, SubtreeFailure};
pub use selection::{FocusRestore, Gesture, SelectionController};
pub use tree::{
    Expansion, InsertRequest, NodeId, NodeKind, NodeSnapshot, PathAddress, Selection, TreeNode,
    TreeObserver, TreeStore,
};

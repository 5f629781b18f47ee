//! Filesystem-facing collaborators: listing sources, MIME lookup and the
//! change watcher.

pub mod mime;
pub mod source;
pub mod watcher;

pub use mime::{ExtensionTable, MimeResolver};
pub use source::{DataSource, DirEntry, FsSource, MemorySource};
pub use watcher::FsWatcher;

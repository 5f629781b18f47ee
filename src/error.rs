use std::path::PathBuf;

use thiserror::Error;

use crate::tree::NodeId;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors reported by the project tree engine.
///
/// Lookup misses are never errors: resolution by id or address returns
/// `Option` so callers can branch on absence directly.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The project root could not be listed; no tree was produced.
    #[error("Root unreadable: {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An insert targeted a node that cannot hold children.
    #[error("Invalid parent: node {0:?} cannot have children")]
    InvalidParent(NodeId),

    /// A serialized path address could not be parsed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// I/O errors from reading node content or config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem watcher setup failures.
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Snapshot serialization failures.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TreeError = io_err.into();
        assert!(matches!(err, TreeError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn root_unreadable_display() {
        let err = TreeError::RootUnreadable {
            path: PathBuf::from("/proj"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Root unreadable: /proj: denied");
    }

    #[test]
    fn invalid_address_display() {
        let err = TreeError::InvalidAddress("0.x".into());
        assert_eq!(err.to_string(), "Invalid address: 0.x");
    }
}

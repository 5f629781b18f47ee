use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    /// Extension without the leading dot, `None` when the name has none.
    pub extension: Option<String>,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name.into(), false)
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self::new(name.into(), true)
    }

    fn new(name: String, is_dir: bool) -> Self {
        let extension = Path::new(&name)
            .extension()
            .map(|e| e.to_string_lossy().to_string());
        Self {
            name,
            is_dir,
            extension,
        }
    }
}

/// Filesystem-like source the tree is populated from.
pub trait DataSource: Send + Sync + 'static {
    /// List a directory in the source's own enumeration order.
    fn list_entries(&self, path: &Path) -> impl Future<Output = io::Result<Vec<DirEntry>>> + Send;

    /// Read a file's bytes.
    fn read_content(&self, path: &Path) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// `DataSource` backed by the local filesystem through `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl DataSource for FsSource {
    async fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            // Entries whose type cannot be read (vanished, broken links) are skipped.
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(error) => {
                    tracing::debug!(path = %entry.path().display(), %error, "skipping entry");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            entries.push(if file_type.is_dir() {
                DirEntry::dir(name)
            } else {
                DirEntry::file(name)
            });
        }
        Ok(entries)
    }

    async fn read_content(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

#[derive(Debug, Clone)]
enum Listing {
    Entries(Vec<DirEntry>),
    Unreadable(io::ErrorKind),
}

/// In-memory `DataSource` for hosts that build trees from non-disk data,
/// and for tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    listings: HashMap<PathBuf, Listing>,
    files: HashMap<PathBuf, Vec<u8>>,
    delays: HashMap<PathBuf, Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory listing.
    pub fn with_dir(mut self, path: impl Into<PathBuf>, entries: Vec<DirEntry>) -> Self {
        self.listings.insert(path.into(), Listing::Entries(entries));
        self
    }

    /// Make listing `path` fail with `PermissionDenied`.
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.listings
            .insert(path.into(), Listing::Unreadable(io::ErrorKind::PermissionDenied));
        self
    }

    /// Register file content for `read_content`.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Delay listing `path` by `delay`.
    pub fn with_delay(mut self, path: impl Into<PathBuf>, delay: Duration) -> Self {
        self.delays.insert(path.into(), delay);
        self
    }
}

impl DataSource for MemorySource {
    async fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        match self.listings.get(path) {
            Some(Listing::Entries(entries)) => Ok(entries.clone()),
            Some(Listing::Unreadable(kind)) => Err(io::Error::new(
                *kind,
                format!("cannot list {}", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", path.display()),
            )),
        }
    }

    async fn read_content(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

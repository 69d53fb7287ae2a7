//! File access used by the synchronizer.
//!
//! Everything that touches the file system goes through [`FileStore`] so the
//! merge logic can run against an in-memory tree in tests and in `--dry-run`.

use std::collections::{
    BTreeMap,
    HashSet,
};
use std::io;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Mutex,
    PoisonError,
};

/// Text file access with "not found" reported as `Ok(None)`.
#[allow(async_fn_in_trait)]
pub trait FileStore {
    /// Reads a whole file, `Ok(None)` when it does not exist.
    async fn read(&self, path: &Path) -> io::Result<Option<String>>;

    /// Replaces a file's contents, creating parent directories as needed.
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Whether `path` is a directory.
    async fn is_dir(&self, path: &Path) -> bool;
}

/// Real file system access via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStore;

impl FileStore for DiskStore {
    async fn read(&self, path: &Path) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok_and(|meta| meta.is_dir())
    }
}

/// In-memory file tree. Directories exist implicitly as path prefixes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// path → contents
    files: Mutex<BTreeMap<PathBuf, String>>,
    /// Paths written through [`FileStore::write`], in order
    writes: Mutex<Vec<PathBuf>>,
    /// Paths whose writes fail with `PermissionDenied`
    read_only: Mutex<HashSet<PathBuf>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file without recording it as a write.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        lock(&self.files).insert(path.into(), contents.into());
    }

    /// Makes every later write to `path` fail.
    pub fn set_read_only(&self, path: impl Into<PathBuf>) {
        lock(&self.read_only).insert(path.into());
    }

    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        lock(&self.files).get(path.as_ref()).cloned()
    }

    /// Paths written so far, in write order.
    #[must_use]
    pub fn written_paths(&self) -> Vec<PathBuf> {
        lock(&self.writes).clone()
    }

    /// Forgets the write log, keeping file contents.
    pub fn clear_writes(&self) {
        lock(&self.writes).clear();
    }
}

impl FileStore for MemoryStore {
    async fn read(&self, path: &Path) -> io::Result<Option<String>> {
        Ok(self.get(path))
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if lock(&self.read_only).contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", path.display()),
            ));
        }
        lock(&self.files).insert(path.to_path_buf(), contents.to_string());
        lock(&self.writes).push(path.to_path_buf());
        Ok(())
    }

    async fn is_dir(&self, path: &Path) -> bool {
        lock(&self.files).keys().any(|file| file != path && file.starts_with(path))
    }
}

/// Wraps another store and keeps writes in memory instead of persisting them.
///
/// Reads see earlier buffered writes, so a full synchronization behaves the
/// same as a real run.
#[derive(Debug)]
pub struct DryRunStore<S> {
    /// Store that serves reads
    inner: S,
    /// Buffered writes
    pending: Mutex<BTreeMap<PathBuf, String>>,
}

impl<S: FileStore> DryRunStore<S> {
    pub const fn new(inner: S) -> Self {
        Self { inner, pending: Mutex::new(BTreeMap::new()) }
    }

    /// Paths that would have been written.
    #[must_use]
    pub fn pending_paths(&self) -> Vec<PathBuf> {
        lock(&self.pending).keys().cloned().collect()
    }
}

impl<S: FileStore> FileStore for DryRunStore<S> {
    async fn read(&self, path: &Path) -> io::Result<Option<String>> {
        let buffered = lock(&self.pending).get(path).cloned();
        match buffered {
            Some(content) => Ok(Some(content)),
            None => self.inner.read(path).await,
        }
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        tracing::info!(path = %path.display(), bytes = contents.len(), "Dry run: skipping write");
        lock(&self.pending).insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    async fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path).await
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

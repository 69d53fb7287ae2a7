//! Core types used throughout the project.

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

/// A page as named in the translation data tree: the data file's path
/// relative to a locale directory (e.g. `blog/home.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(PathBuf);

impl PageId {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for PageId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

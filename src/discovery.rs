//! Discovery of the data pages to synchronize.
//!
//! Pages are the files under the first locale's directory that match
//! `translationFiles.includePatterns` and none of its `excludePatterns`.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;

use crate::config::TranslationFilesConfig;
use crate::types::PageId;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Invalid include pattern '{pattern}': {source}")]
    InvalidIncludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),

    #[error("Locale directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
}

/// Matches page ids against the configured glob patterns.
#[derive(Debug, Clone)]
pub struct PageMatcher {
    /// `includePatterns`
    include_set: GlobSet,
    /// `excludePatterns`
    exclude_set: GlobSet,
}

impl PageMatcher {
    /// # Errors
    /// Returns error if a pattern is not a valid glob.
    pub fn new(config: &TranslationFilesConfig) -> Result<Self, DiscoveryError> {
        let include_set = build_glob_set(&config.include_patterns, |pattern, source| {
            DiscoveryError::InvalidIncludePattern { pattern, source }
        })?;
        let exclude_set = build_glob_set(&config.exclude_patterns, |pattern, source| {
            DiscoveryError::InvalidExcludePattern { pattern, source }
        })?;

        Ok(Self { include_set, exclude_set })
    }

    /// The path must be relative to the locale directory.
    #[must_use]
    pub fn is_page(&self, relative_path: &Path) -> bool {
        self.include_set.is_match(relative_path) && !self.exclude_set.is_match(relative_path)
    }
}

/// Compiles `patterns`, mapping a bad pattern through `make_error`.
fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, DiscoveryError>
where
    F: Fn(String, globset::Error) -> DiscoveryError,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Lists the pages under `locale_dir`, sorted.
///
/// Ignore files are not honored: translation data is often git-ignored.
///
/// # Errors
/// Returns error if `locale_dir` is missing or a pattern is invalid.
pub fn find_pages(
    locale_dir: &Path,
    config: &TranslationFilesConfig,
) -> Result<Vec<PageId>, DiscoveryError> {
    if !locale_dir.is_dir() {
        return Err(DiscoveryError::MissingDirectory(locale_dir.to_path_buf()));
    }
    let matcher = PageMatcher::new(config)?;

    let mut pages = Vec::new();
    for result in WalkBuilder::new(locale_dir)
        .standard_filters(false)
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let Ok(relative_path) = entry.path().strip_prefix(locale_dir) else {
            continue;
        };
        if matcher.is_page(relative_path) {
            pages.push(PageId::new(relative_path));
        }
    }

    pages.sort();
    tracing::debug!(dir = %locale_dir.display(), count = pages.len(), "Discovered pages");
    Ok(pages)
}

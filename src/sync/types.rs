use std::fmt;

use thiserror::Error;

use crate::error::RecordError;
use crate::registry::TranslationKey;
use crate::types::PageId;
use crate::walker::Divergence;

/// Steps of one page's synchronization, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    Init,
    LoadContent,
    MatchPass,
    PersistLocales,
    ReloadLocales,
    PropagatePass,
    Serialize,
    Done,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::LoadContent => "load content",
            Self::MatchPass => "match pass",
            Self::PersistLocales => "persist locales",
            Self::ReloadLocales => "reload locales",
            Self::PropagatePass => "propagate pass",
            Self::Serialize => "serialize",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Why a page was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The page id names a directory
    Container,
    /// No content page corresponds to the data page
    NoContentRecord,
    /// The content page has no block tree in its front matter
    NoContentBlocks,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Container => "is a directory",
            Self::NoContentRecord => "has no visually editable content page",
            Self::NoContentBlocks => "has no content blocks",
        };
        f.write_str(reason)
    }
}

/// What a completed synchronization did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    /// Keys with at least one inline value written back to the data files
    pub updated_keys: Vec<TranslationKey>,
    /// Locales whose data file was rewritten
    pub locales_written: Vec<String>,
    /// Whether the content page was rewritten
    pub content_written: bool,
    /// Values discarded by the last-wins rule
    pub divergences: Vec<Divergence>,
    /// Requested keys missing from the registry
    pub unknown_keys: Vec<TranslationKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Skipped(SkipReason),
    Synced(PageSummary),
}

/// A page whose synchronization stopped at `state`.
#[derive(Error, Debug)]
#[error("Failed to sync page '{page}' during {state}: {source}")]
pub struct PageError {
    pub page: PageId,
    pub state: PageState,
    #[source]
    pub source: RecordError,
}

/// Results of every page in a run, in the order the pages were given.
#[derive(Debug, Default)]
pub struct RunReport {
    pub pages: Vec<(PageId, Result<PageOutcome, PageError>)>,
}

impl RunReport {
    #[must_use]
    pub fn synced(&self) -> usize {
        self.count(|result| matches!(result, Ok(PageOutcome::Synced(_))))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|result| matches!(result, Ok(PageOutcome::Skipped(_))))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Result::is_err)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Outcome of one page, if it was part of the run.
    #[must_use]
    pub fn outcome(&self, page: &PageId) -> Option<&Result<PageOutcome, PageError>> {
        self.pages.iter().find(|(id, _)| id == page).map(|(_, result)| result)
    }

    fn count(&self, predicate: impl Fn(&Result<PageOutcome, PageError>) -> bool) -> usize {
        self.pages.iter().filter(|(_, result)| predicate(result)).count()
    }
}

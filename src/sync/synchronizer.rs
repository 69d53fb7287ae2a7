use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{
    PageError,
    PageOutcome,
    PageResolver,
    PageState,
    PageSummary,
    RunReport,
    SkipReason,
};
use crate::config::ConfigManager;
use crate::content::{
    BlockSchema,
    ContentTree,
    PageRecord,
};
use crate::error::RecordError;
use crate::locale_store::{
    LocaleSnapshot,
    LocaleStore,
    RecordUpdates,
};
use crate::markup::MarkupConverter;
use crate::registry::{
    CanonicalTable,
    KeyRegistry,
    TranslationKey,
};
use crate::storage::FileStore;
use crate::types::PageId;
use crate::walker::BlockWalker;

/// Settings shared by every page of a run.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Locales to synchronize, in order
    pub locales: Vec<String>,
    /// Directory holding one sub-directory per locale
    pub translations_dir: PathBuf,
    /// Data page → content page mapping
    pub resolver: PageResolver,
    pub schema: BlockSchema,
}

impl SyncContext {
    /// Builds the context from loaded settings, resolving directories
    /// against the workspace root.
    #[must_use]
    pub fn from_config(config: &ConfigManager) -> Self {
        let settings = config.get_settings();
        Self {
            locales: settings.locales.clone(),
            translations_dir: config.resolve(&settings.translations_dir),
            resolver: PageResolver::new(config.resolve(&settings.content_dir), &settings.pages),
            schema: BlockSchema::from(&settings.blocks),
        }
    }
}

/// Reconciles locale data files with the inline translations of their
/// content pages.
///
/// Each page runs through [`PageState`] in order. A failure stops only the
/// page it happened on.
#[derive(Debug)]
pub struct PageSynchronizer<S> {
    /// File access for locale records and content pages
    store: S,
    /// Locales, directories and block layout
    context: SyncContext,
    /// Canonical text of every registry key
    canonical: CanonicalTable,
    /// Keys to synchronize, in order
    keys: Vec<TranslationKey>,
}

impl<S: FileStore> PageSynchronizer<S> {
    /// Prepares a run over every key of `registry`.
    #[must_use]
    pub fn new(
        store: S,
        context: SyncContext,
        registry: &KeyRegistry,
        converter: &impl MarkupConverter,
    ) -> Self {
        let canonical = registry.canonical_table(converter);
        tracing::debug!(keys = canonical.len(), "Computed canonical texts");
        Self { store, context, canonical, keys: registry.keys().cloned().collect() }
    }

    /// Restricts the run to `keys`. Keys missing from the registry are
    /// reported per page and skipped.
    #[must_use]
    pub fn with_keys(mut self, keys: Vec<TranslationKey>) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Synchronizes every page concurrently. Results keep the order of `pages`.
    pub async fn sync_pages(&self, pages: &[PageId]) -> RunReport {
        let runs = pages.iter().map(|page| async move {
            let result = self.sync_page(page).await;
            log_outcome(page, &result);
            (page.clone(), result)
        });

        RunReport { pages: futures::future::join_all(runs).await }
    }

    /// Synchronizes one page.
    ///
    /// # Errors
    /// Returns error if a record of the page cannot be read, parsed or
    /// written. Locale records persisted before the failure stay persisted.
    pub async fn sync_page(&self, page: &PageId) -> Result<PageOutcome, PageError> {
        let locales = LocaleStore::new(&self.store, &self.context.translations_dir);

        enter(page, PageState::Init);
        if let Some(first) = self.context.locales.first()
            && self.store.is_dir(&locales.record_path(first, page)).await
        {
            return Ok(PageOutcome::Skipped(SkipReason::Container));
        }
        let Some(content_path) = self.context.resolver.resolve(page) else {
            return Ok(PageOutcome::Skipped(SkipReason::NoContentRecord));
        };
        let original = self
            .store
            .read(&content_path)
            .await
            .map_err(|source| RecordError::Read { path: content_path.clone(), source })
            .map_err(failed_at(page, PageState::Init))?;
        let Some(original) = original else {
            return Ok(PageOutcome::Skipped(SkipReason::NoContentRecord));
        };

        enter(page, PageState::LoadContent);
        let PageRecord { header, body } = PageRecord::parse(&content_path, &original)
            .map_err(failed_at(page, PageState::LoadContent))?;
        let Some(mut tree) =
            header.and_then(|header| ContentTree::from_header(header, &self.context.schema))
        else {
            return Ok(PageOutcome::Skipped(SkipReason::NoContentBlocks));
        };
        let before = locales
            .load_snapshot(&self.context.locales, page)
            .await
            .map_err(failed_at(page, PageState::LoadContent))?;

        enter(page, PageState::MatchPass);
        let mut summary = PageSummary::default();
        let resolved = self.resolve_keys(page, &mut summary);
        let walker = BlockWalker::new(&self.context.locales, &self.context.schema);
        let pending = Self::match_pass(page, &walker, &tree, &resolved, &before, &mut summary);

        enter(page, PageState::PersistLocales);
        let store = &locales;
        let merges = pending.iter().map(|(locale, updates)| async move {
            store.merge(locale, page, updates).await.map(|()| locale.clone())
        });
        for result in futures::future::join_all(merges).await {
            summary.locales_written.push(result.map_err(failed_at(page, PageState::PersistLocales))?);
        }

        enter(page, PageState::ReloadLocales);
        let after = locales
            .load_snapshot(&self.context.locales, page)
            .await
            .map_err(failed_at(page, PageState::ReloadLocales))?;

        enter(page, PageState::PropagatePass);
        for &(key, canonical) in &resolved {
            walker.propagate_pass(tree.root_mut(), key, canonical, &after);
        }

        enter(page, PageState::Serialize);
        let rendered = PageRecord { header: Some(tree.into_header()), body }
            .render()
            .map_err(|source| RecordError::Serialize { path: content_path.clone(), source })
            .map_err(failed_at(page, PageState::Serialize))?;
        if rendered != original {
            self.store
                .write(&content_path, &rendered)
                .await
                .map_err(|source| RecordError::Write { path: content_path.clone(), source })
                .map_err(failed_at(page, PageState::Serialize))?;
            summary.content_written = true;
        }

        enter(page, PageState::Done);
        Ok(PageOutcome::Synced(summary))
    }

    /// Canonical text of each key of the run. Unknown keys are logged and
    /// recorded in `summary`.
    fn resolve_keys<'s>(
        &'s self,
        page: &PageId,
        summary: &mut PageSummary,
    ) -> Vec<(&'s TranslationKey, &'s str)> {
        let mut resolved = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            match self.canonical.get(key) {
                Ok(canonical) => resolved.push((key, canonical)),
                Err(e) => {
                    tracing::warn!(page = %page, "{e}, skipping");
                    summary.unknown_keys.push(key.clone());
                }
            }
        }
        resolved
    }

    /// Runs pass 1 for every key and groups the updates by locale.
    fn match_pass(
        page: &PageId,
        walker: &BlockWalker<'_>,
        tree: &ContentTree,
        resolved: &[(&TranslationKey, &str)],
        before: &LocaleSnapshot,
        summary: &mut PageSummary,
    ) -> BTreeMap<String, RecordUpdates> {
        let mut pending: BTreeMap<String, RecordUpdates> = BTreeMap::new();
        for &(key, canonical) in resolved {
            let outcome = walker.match_pass(tree.root(), key, canonical, before);
            for divergence in &outcome.divergences {
                tracing::warn!(
                    page = %page,
                    key = %divergence.key,
                    locale = %divergence.locale,
                    discarded = %divergence.discarded,
                    kept = %divergence.kept,
                    "Duplicate blocks disagree, keeping the last one"
                );
            }
            if !outcome.updates.is_empty() {
                summary.updated_keys.push(key.clone());
            }
            for (locale, value) in outcome.updates {
                pending.entry(locale).or_default().insert(key.clone(), value);
            }
            summary.divergences.extend(outcome.divergences);
        }
        pending
    }
}

/// Logs a state transition.
fn enter(page: &PageId, state: PageState) {
    tracing::debug!(page = %page, state = %state, "Entering state");
}

/// Wraps a record error with the page and the state it happened in.
fn failed_at(page: &PageId, state: PageState) -> impl FnOnce(RecordError) -> PageError + '_ {
    move |source| PageError { page: page.clone(), state, source }
}

/// Logs the result of one page.
fn log_outcome(page: &PageId, result: &Result<PageOutcome, PageError>) {
    match result {
        Ok(PageOutcome::Synced(summary)) => tracing::info!(
            page = %page,
            updated_keys = summary.updated_keys.len(),
            locales_written = ?summary.locales_written,
            content_written = summary.content_written,
            "Synced page"
        ),
        Ok(PageOutcome::Skipped(reason)) => {
            tracing::warn!(page = %page, "Skipping page: {reason}");
        }
        Err(e) => tracing::error!("{e}"),
    }
}

//! One synchronization run over a workspace.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{
    ConfigError,
    ConfigManager,
};
use crate::discovery::{
    self,
    DiscoveryError,
};
use crate::markup::HtmlToMarkdown;
use crate::registry::{
    KeyRegistry,
    RegistryError,
    TranslationKey,
};
use crate::storage::{
    DiskStore,
    DryRunStore,
    FileStore,
};
use crate::sync::{
    PageSynchronizer,
    RunReport,
    SyncContext,
};
use crate::types::PageId;

/// Errors that prevent a run from starting. Page failures are reported in
/// the [`RunReport`] instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// What to synchronize and how.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory holding `.rosey-sync.json`; other paths resolve against it
    pub workspace: PathBuf,
    /// Replaces the configured locales
    pub locales: Option<Vec<String>>,
    /// Restricts the run to these keys; empty means every registry key
    pub keys: Vec<TranslationKey>,
    /// Restricts the run to these pages; empty means every discovered page
    pub pages: Vec<PageId>,
    /// Buffer writes instead of persisting them
    pub dry_run: bool,
}

/// Loads configuration and registry, then synchronizes every page.
///
/// # Errors
/// Returns error if the configuration, the key registry or the page list
/// cannot be loaded.
pub async fn run(options: RunOptions) -> Result<RunReport, RunError> {
    let RunOptions { workspace, locales, keys, pages, dry_run } = options;
    let config = ConfigManager::load(workspace, locales)?;
    let settings = config.get_settings();

    let registry = KeyRegistry::load(&config.resolve(&settings.base_file)).await?;
    let context = SyncContext::from_config(&config);

    let pages = if pages.is_empty() {
        let first_locale = context.locales.first().cloned().unwrap_or_default();
        discovery::find_pages(
            &context.translations_dir.join(first_locale),
            &settings.translation_files,
        )?
    } else {
        pages
    };
    tracing::info!(
        pages = pages.len(),
        keys = registry.len(),
        locales = ?context.locales,
        "Starting synchronization"
    );

    let report = if dry_run {
        let synchronizer = build_synchronizer(DryRunStore::new(DiskStore), context, &registry, keys);
        let report = synchronizer.sync_pages(&pages).await;
        tracing::info!(
            files = synchronizer.store().pending_paths().len(),
            "Dry run finished, nothing was written"
        );
        report
    } else {
        build_synchronizer(DiskStore, context, &registry, keys).sync_pages(&pages).await
    };

    tracing::info!(
        synced = report.synced(),
        skipped = report.skipped(),
        failed = report.failed(),
        "Synchronization finished"
    );
    Ok(report)
}

/// Synchronizer over `keys`, or over every registry key when `keys` is empty.
fn build_synchronizer<S: FileStore>(
    store: S,
    context: SyncContext,
    registry: &KeyRegistry,
    keys: Vec<TranslationKey>,
) -> PageSynchronizer<S> {
    let synchronizer = PageSynchronizer::new(store, context, registry, &HtmlToMarkdown::new());
    if keys.is_empty() { synchronizer } else { synchronizer.with_keys(keys) }
}

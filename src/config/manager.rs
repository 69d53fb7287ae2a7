//! Validated settings of one workspace.

use std::path::PathBuf;

use super::{
    ConfigError,
    SyncSettings,
    loader,
};

/// Settings of a workspace, validated and fixed for the run.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings: SyncSettings,
    /// Directory configured paths are relative to
    workspace_root: PathBuf,
}

impl ConfigManager {
    /// Reads `.rosey-sync.json` under `workspace_root` (defaults when absent),
    /// applies `locale_override` (`--locales` / `LOCALES`) and validates.
    ///
    /// # Errors
    /// Returns error if the settings file cannot be read or parsed, or if the
    /// resulting settings are invalid.
    pub fn load(
        workspace_root: impl Into<PathBuf>,
        locale_override: Option<Vec<String>>,
    ) -> Result<Self, ConfigError> {
        let workspace_root = workspace_root.into();
        let mut settings = loader::read_settings(&workspace_root)?.unwrap_or_default();

        if let Some(locales) = locale_override {
            tracing::debug!(?locales, "Locales overridden");
            settings.locales = locales;
        }
        Self::with_settings(workspace_root, settings)
    }

    /// # Errors
    /// Returns [`ConfigError::ValidationErrors`] if `settings` are invalid.
    pub fn with_settings(
        workspace_root: impl Into<PathBuf>,
        settings: SyncSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        let workspace_root = workspace_root.into();
        tracing::debug!(root = %workspace_root.display(), ?settings, "Settings loaded");
        Ok(Self { settings, workspace_root })
    }

    #[must_use]
    pub const fn get_settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// `relative` joined onto the workspace root.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.workspace_root.join(relative)
    }
}

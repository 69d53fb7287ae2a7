//! Translation key registry (`base.json`).

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use serde::Deserialize;
use thiserror::Error;

use crate::markup::{
    MarkupConverter,
    normalize_text,
};

/// Stable identifier of one unit of translatable source text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct TranslationKey(String);

impl TranslationKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TranslationKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Translation key '{0}' is not in the registry")]
    KeyNotFound(TranslationKey),

    #[error("Failed to read key registry {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse key registry {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One registry entry. Other fields of the base file are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyEntry {
    /// Source markup as extracted from the built site
    pub original: String,
}

/// Shape of the base key file.
#[derive(Debug, Deserialize)]
struct BaseFile {
    /// Every key known to the site
    #[serde(default)]
    keys: BTreeMap<TranslationKey, KeyEntry>,
}

/// Every translation key and its source markup. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    /// key → entry, ordered by key
    entries: BTreeMap<TranslationKey, KeyEntry>,
}

impl KeyRegistry {
    /// Parses the JSON text of a base key file.
    ///
    /// # Errors
    /// Returns error if the text is not a valid base key file.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let base: BaseFile = serde_json::from_str(text)?;
        Ok(Self { entries: base.keys })
    }

    /// Loads the base key file from disk.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RegistryError::Read { path: path.to_path_buf(), source })?;
        let registry = Self::from_json(&text)
            .map_err(|source| RegistryError::Parse { path: path.to_path_buf(), source })?;

        tracing::debug!(path = %path.display(), keys = registry.len(), "Loaded key registry");
        Ok(registry)
    }

    pub fn insert(&mut self, key: impl Into<TranslationKey>, original: impl Into<String>) {
        self.entries.insert(key.into(), KeyEntry { original: original.into() });
    }

    pub fn keys(&self) -> impl Iterator<Item = &TranslationKey> {
        self.entries.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The key's source markup converted and normalized for comparison.
    ///
    /// # Errors
    /// [`RegistryError::KeyNotFound`] if the key is unknown.
    pub fn canonical_text(
        &self,
        key: &TranslationKey,
        converter: &impl MarkupConverter,
    ) -> Result<String, RegistryError> {
        let entry =
            self.entries.get(key).ok_or_else(|| RegistryError::KeyNotFound(key.clone()))?;
        Ok(normalize_text(&converter.convert(entry.original.trim())))
    }

    /// Converts every key once so page passes never repeat the conversion.
    #[must_use]
    pub fn canonical_table(&self, converter: &impl MarkupConverter) -> CanonicalTable {
        let entries = self
            .entries
            .keys()
            .filter_map(|key| Some((key.clone(), self.canonical_text(key, converter).ok()?)))
            .collect();
        CanonicalTable { entries }
    }
}

/// Canonical text of each key, computed once per run.
#[derive(Debug, Clone, Default)]
pub struct CanonicalTable {
    /// key → canonical text
    entries: HashMap<TranslationKey, String>,
}

impl CanonicalTable {
    /// # Errors
    /// [`RegistryError::KeyNotFound`] if the key is unknown.
    pub fn get(&self, key: &TranslationKey) -> Result<&str, RegistryError> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| RegistryError::KeyNotFound(key.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

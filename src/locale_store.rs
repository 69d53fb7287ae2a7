//! Per-locale, per-page translation data files.
//!
//! Each `(locale, page)` pair is one YAML mapping of translation key to
//! translated text, stored at `<translations_dir>/<locale>/<page>`.

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::path::{
    Path,
    PathBuf,
};

use serde_yaml::{
    Mapping,
    Value,
};

use crate::error::RecordError;
use crate::registry::TranslationKey;
use crate::storage::FileStore;
use crate::types::PageId;

/// Stored translations of one page in one locale.
pub type LocaleRecord = HashMap<TranslationKey, String>;

/// Values to write into one locale record: key → new translated text.
pub type RecordUpdates = BTreeMap<TranslationKey, String>;

/// A page's stored translations for every configured locale, read at one
/// point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleSnapshot {
    /// locale → record
    records: HashMap<String, LocaleRecord>,
}

impl LocaleSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locale: impl Into<String>, record: LocaleRecord) {
        self.records.insert(locale.into(), record);
    }

    /// The stored value for a key in a locale, if any.
    #[must_use]
    pub fn get(&self, locale: &str, key: &TranslationKey) -> Option<&str> {
        self.records.get(locale)?.get(key).map(String::as_str)
    }
}

/// Reads and merges locale records through a [`FileStore`].
#[derive(Debug)]
pub struct LocaleStore<'a, S> {
    /// Backing file access
    store: &'a S,
    /// Directory holding one sub-directory per locale
    translations_dir: &'a Path,
}

impl<'a, S: FileStore> LocaleStore<'a, S> {
    pub const fn new(store: &'a S, translations_dir: &'a Path) -> Self {
        Self { store, translations_dir }
    }

    #[must_use]
    pub fn record_path(&self, locale: &str, page: &PageId) -> PathBuf {
        self.translations_dir.join(locale).join(page.as_path())
    }

    /// Loads one record. A missing record is an empty mapping: the page may
    /// simply have no translations in this locale yet.
    ///
    /// # Errors
    /// Returns error if the record cannot be read or is not a YAML mapping.
    pub async fn load(&self, locale: &str, page: &PageId) -> Result<LocaleRecord, RecordError> {
        let path = self.record_path(locale, page);
        let Some(mapping) = self.read_mapping(&path).await? else {
            tracing::debug!(path = %path.display(), "Locale record not found, using empty record");
            return Ok(LocaleRecord::new());
        };

        let mut record = LocaleRecord::with_capacity(mapping.len());
        for (key, value) in &mapping {
            let (Some(key), Some(value)) = (key_text(key), value.as_str()) else {
                tracing::debug!(path = %path.display(), ?key, "Skipping non-text locale entry");
                continue;
            };
            record.insert(TranslationKey::new(key), value.to_string());
        }
        Ok(record)
    }

    /// Loads the page's record for every locale concurrently.
    ///
    /// # Errors
    /// Returns the first error among the locales.
    pub async fn load_snapshot(
        &self,
        locales: &[String],
        page: &PageId,
    ) -> Result<LocaleSnapshot, RecordError> {
        let loads = locales.iter().map(|locale| async move {
            self.load(locale, page).await.map(|record| (locale.clone(), record))
        });

        let mut snapshot = LocaleSnapshot::new();
        for result in futures::future::join_all(loads).await {
            let (locale, record) = result?;
            snapshot.insert(locale, record);
        }
        Ok(snapshot)
    }

    /// Overwrites exactly the keys in `updates` and persists the record.
    ///
    /// Every other entry keeps its value and position. A missing record is
    /// created.
    ///
    /// # Errors
    /// Returns error if the existing record cannot be read or parsed, or the
    /// result cannot be written.
    pub async fn merge(
        &self,
        locale: &str,
        page: &PageId,
        updates: &RecordUpdates,
    ) -> Result<(), RecordError> {
        let path = self.record_path(locale, page);
        let mut mapping = self.read_mapping(&path).await?.unwrap_or_default();

        for (key, value) in updates {
            let existing =
                mapping.keys().find(|stored| key_text(stored).as_deref() == Some(key.as_str()));
            let slot = existing.cloned().unwrap_or_else(|| Value::String(key.to_string()));
            mapping.insert(slot, Value::String(value.clone()));
        }

        let text = serde_yaml::to_string(&mapping)
            .map_err(|source| RecordError::Serialize { path: path.clone(), source })?;
        self.store
            .write(&path, &text)
            .await
            .map_err(|source| RecordError::Write { path: path.clone(), source })?;

        tracing::debug!(path = %path.display(), keys = updates.len(), "Merged locale record");
        Ok(())
    }

    /// Reads a record as a raw YAML mapping, `None` when it does not exist.
    async fn read_mapping(&self, path: &Path) -> Result<Option<Mapping>, RecordError> {
        let text = self
            .store
            .read(path)
            .await
            .map_err(|source| RecordError::Read { path: path.to_path_buf(), source })?;

        text.map(|text| parse_mapping(path, &text)).transpose()
    }
}

/// Text of a record key. Scalar keys such as `123:` or `true:` count as the
/// translation key `"123"` or `"true"`; other keys are not translation keys.
fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(key) => Some(key.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Parses a locale record. Blank text is an empty mapping.
fn parse_mapping(path: &Path, text: &str) -> Result<Mapping, RecordError> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(text) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(RecordError::malformed(path, "expected a mapping of translation keys")),
        Err(e) => Err(RecordError::malformed(path, e.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_utils::locale_snapshot;

    const FR_HOME: &str = "t/fr/home.yaml";

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_file(FR_HOME, "intro: Bonjour\ncount: 3\nouter: Dehors\n")
            .with_file("t/de/home.yaml", "intro: Hallo\n")
    }

    fn updates(pairs: &[(&str, &str)]) -> RecordUpdates {
        pairs.iter().map(|(k, v)| (TranslationKey::from(*k), (*v).to_string())).collect()
    }

    #[rstest]
    #[tokio::test]
    async fn load_keeps_string_values_only(store: MemoryStore) {
        let locales = LocaleStore::new(&store, Path::new("t"));

        let record = locales.load("fr", &"home.yaml".into()).await.unwrap();

        assert_that!(record.get(&TranslationKey::from("intro")), some(eq("Bonjour")));
        assert_that!(record.get(&TranslationKey::from("count")), none());
        assert_that!(record.len(), eq(2));
    }

    #[rstest]
    #[tokio::test]
    async fn load_reads_scalar_keys_as_text() {
        let store = MemoryStore::new()
            .with_file(FR_HOME, "123: Cent vingt-trois\ntrue: Vrai\n[a, b]: Liste\nintro: Bonjour\n");
        let locales = LocaleStore::new(&store, Path::new("t"));

        let record = locales.load("fr", &"home.yaml".into()).await.unwrap();

        assert_that!(record.get(&TranslationKey::from("123")), some(eq("Cent vingt-trois")));
        assert_that!(record.get(&TranslationKey::from("true")), some(eq("Vrai")));
        assert_that!(record.len(), eq(3));
    }

    #[rstest]
    #[tokio::test]
    async fn load_missing_record_is_empty(store: MemoryStore) {
        let locales = LocaleStore::new(&store, Path::new("t"));

        let record = locales.load("es", &"home.yaml".into()).await.unwrap();

        assert_that!(record, is_empty());
    }

    #[rstest]
    #[case::sequence("- a\n- b\n")]
    #[case::invalid_yaml("key: [unclosed\n")]
    #[tokio::test]
    async fn load_malformed_record_fails(#[case] text: &str) {
        let store = MemoryStore::new().with_file(FR_HOME, text);
        let locales = LocaleStore::new(&store, Path::new("t"));

        let result = locales.load("fr", &"home.yaml".into()).await;

        assert!(matches!(result, Err(RecordError::Malformed { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn load_snapshot_reads_every_locale(store: MemoryStore) {
        let locales = LocaleStore::new(&store, Path::new("t"));
        let configured = vec!["fr".to_string(), "de".to_string(), "es".to_string()];

        let snapshot = locales.load_snapshot(&configured, &"home.yaml".into()).await.unwrap();

        assert_that!(snapshot.get("fr", &"intro".into()), some(eq("Bonjour")));
        assert_that!(snapshot.get("de", &"intro".into()), some(eq("Hallo")));
        let mut expected = locale_snapshot(&[
            ("fr", "intro", "Bonjour"),
            ("fr", "outer", "Dehors"),
            ("de", "intro", "Hallo"),
        ]);
        expected.insert("es", LocaleRecord::new());
        assert_eq!(snapshot, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn merge_overwrites_only_given_keys(store: MemoryStore) {
        let locales = LocaleStore::new(&store, Path::new("t"));

        locales
            .merge("fr", &"home.yaml".into(), &updates(&[("intro", "Salut"), ("new", "Neuf")]))
            .await
            .unwrap();

        assert_that!(
            store.get(FR_HOME),
            some(eq("intro: Salut\ncount: 3\nouter: Dehors\nnew: Neuf\n"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn merge_replaces_numeric_key_in_place() {
        let store = MemoryStore::new().with_file(FR_HOME, "123: foo\nintro: Bonjour\n");
        let locales = LocaleStore::new(&store, Path::new("t"));

        locales
            .merge("fr", &"home.yaml".into(), &updates(&[("123", "bar"), ("456", "baz")]))
            .await
            .unwrap();

        assert_that!(store.get(FR_HOME), some(eq("123: bar\nintro: Bonjour\n'456': baz\n")));
    }

    #[rstest]
    #[tokio::test]
    async fn merge_creates_missing_record(store: MemoryStore) {
        let locales = LocaleStore::new(&store, Path::new("t"));

        locales.merge("es", &"home.yaml".into(), &updates(&[("intro", "Hola")])).await.unwrap();

        assert_that!(store.get("t/es/home.yaml"), some(eq("intro: Hola\n")));
    }

    #[rstest]
    #[tokio::test]
    async fn merge_write_failure_is_reported(store: MemoryStore) {
        store.set_read_only(FR_HOME);
        let locales = LocaleStore::new(&store, Path::new("t"));

        let result = locales.merge("fr", &"home.yaml".into(), &updates(&[("intro", "Salut")])).await;

        assert!(matches!(result, Err(RecordError::Write { .. })));
        assert_that!(store.get(FR_HOME), some(starts_with("intro: Bonjour")));
    }
}

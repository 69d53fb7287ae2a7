use std::collections::{
    BTreeMap,
    HashSet,
};

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "locales[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Locales to synchronize, in order.
    ///
    /// The first locale's translation directory is the one scanned for pages.
    pub locales: Vec<String>,

    /// Key registry (`{ "keys": { "<key>": { "original": "..." } } }`).
    pub base_file: String,
    /// Root of the per-locale data files (`<translationsDir>/<locale>/<page>`).
    pub translations_dir: String,
    /// Root of the visually editable content pages.
    pub content_dir: String,

    pub translation_files: TranslationFilesConfig,
    pub pages: PagesConfig,
    pub blocks: BlocksConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self { include_patterns: vec!["**/*.yaml".to_string()], exclude_patterns: Vec::new() }
    }
}

/// How a data page id maps onto a content page path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagesConfig {
    pub data_extension: String,
    pub content_extension: String,
    /// File stem renames applied when resolving content pages (e.g. `home` -> `index`).
    pub aliases: BTreeMap<String, String>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            data_extension: "yaml".to_string(),
            content_extension: "md".to_string(),
            aliases: BTreeMap::from([("home".to_string(), "index".to_string())]),
        }
    }
}

/// Shape of the content blocks inside a page's front matter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlocksConfig {
    /// Front matter field holding the block tree.
    pub field: String,
    /// Mapping key whose string value marks a translatable leaf.
    pub source_key: String,
    /// Prepended to the locale code to form a leaf's inline value key.
    pub locale_key_prefix: String,
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            field: "content_blocks".to_string(),
            source_key: "original".to_string(),
            locale_key_prefix: String::new(),
        }
    }
}

impl SyncSettings {
    /// # Errors
    /// - No locale configured, blank or duplicated locale
    /// - Empty directory or file setting
    /// - Invalid glob pattern
    /// - Block keys that collide with each other
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.locales.is_empty() {
            errors.push(ValidationError::new(
                "locales",
                "At least one locale is required. Example: [\"fr\", \"de\"] or LOCALES=fr,de",
            ));
        }

        let mut seen = HashSet::new();
        for (index, locale) in self.locales.iter().enumerate() {
            if locale.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("locales[{index}]"),
                    "The locale cannot be empty",
                ));
            } else if !seen.insert(locale.as_str()) {
                errors.push(ValidationError::new(
                    format!("locales[{index}]"),
                    format!("Duplicate locale '{locale}'"),
                ));
            }

            if self.blocks.locale_key_prefix.clone() + locale == self.blocks.source_key {
                errors.push(ValidationError::new(
                    format!("locales[{index}]"),
                    format!(
                        "Inline key for locale '{locale}' collides with blocks.sourceKey '{}'",
                        self.blocks.source_key
                    ),
                ));
            }
        }

        for (field_path, value) in [
            ("baseFile", &self.base_file),
            ("translationsDir", &self.translations_dir),
            ("contentDir", &self.content_dir),
            ("pages.dataExtension", &self.pages.data_extension),
            ("pages.contentExtension", &self.pages.content_extension),
            ("blocks.field", &self.blocks.field),
            ("blocks.sourceKey", &self.blocks.source_key),
        ] {
            if value.is_empty() {
                errors.push(ValidationError::new(field_path, "The value cannot be empty"));
            }
        }

        if self.translation_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/*.yaml\"]",
            ));
        }

        for (index, pattern) in self.translation_files.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("translationFiles.includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.translation_files.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("translationFiles.excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            locales: Vec::new(),
            base_file: "rosey/base.json".to_string(),
            translations_dir: "rosey/translations".to_string(),
            content_dir: "src/content/pages".to_string(),
            translation_files: TranslationFilesConfig::default(),
            pages: PagesConfig::default(),
            blocks: BlocksConfig::default(),
        }
    }
}

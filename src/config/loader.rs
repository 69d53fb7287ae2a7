//! Reading `.rosey-sync.json` from the workspace root.

use std::io::ErrorKind;
use std::path::Path;

use super::{
    ConfigError,
    SyncSettings,
};

pub(super) const CONFIG_FILE_NAME: &str = ".rosey-sync.json";

/// Parsed settings file of `workspace_root`, unvalidated.
///
/// `Ok(None)` when the workspace has no settings file.
///
/// # Errors
/// Returns error if the file exists but cannot be read or is not valid JSON.
pub(super) fn read_settings(workspace_root: &Path) -> Result<Option<SyncSettings>, ConfigError> {
    let path = workspace_root.join(CONFIG_FILE_NAME);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let settings = serde_json::from_str(&text)?;
    tracing::debug!(path = %path.display(), "Read settings file");
    Ok(Some(settings))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn read_settings_parses_camel_case_fields() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"{"locales": ["fr", "de"], "contentDir": "content", "blocks": {"sourceKey": "source"}}"#,
        )
        .unwrap();

        let settings = read_settings(temp_dir.path()).unwrap().unwrap();

        assert_that!(settings.locales, elements_are![eq("fr"), eq("de")]);
        assert_that!(settings.content_dir, eq("content"));
        assert_that!(settings.blocks.source_key, eq("source"));
        assert_that!(settings.blocks.field, eq("content_blocks"));
    }

    #[rstest]
    fn read_settings_without_file() {
        let temp_dir = TempDir::new().unwrap();

        assert_that!(read_settings(temp_dir.path()).unwrap(), none());
    }

    #[rstest]
    #[case::not_json("invalid json")]
    #[case::wrong_type(r#"{"locales": "fr"}"#)]
    fn read_settings_rejects_malformed_file(#[case] contents: &str) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), contents).unwrap();

        assert!(matches!(read_settings(temp_dir.path()), Err(ConfigError::ParseError(_))));
    }

    #[rstest]
    fn read_settings_unreadable_path_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();

        assert!(matches!(read_settings(temp_dir.path()), Err(ConfigError::IoError(_))));
    }
}

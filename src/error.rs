use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading, parsing or writing a structured record
/// (locale data file or content page).
#[derive(Error, Debug)]
pub enum RecordError {
    /// The record exists but could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The record could not be parsed
    #[error("Malformed record {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
    /// The record could not be serialized
    #[error("Failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// The record could not be persisted
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecordError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed { path: path.into(), message: message.into() }
    }
}

use std::path::PathBuf;

use thiserror::Error;

use crate::probe::MediaKind;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },
    #[error("duplicate identifier {id} in {collection}")]
    DuplicateIdentifier { collection: &'static str, id: String },
    #[error("track not found: {0}")]
    TrackNotFound(String),
    #[error("reference track {track_id} has no segment at index {index}")]
    ReferenceSegmentMissing { track_id: String, index: usize },
    #[error("expected {expected} media at {path}, probe reported {found}")]
    UnsupportedMediaKind {
        path: PathBuf,
        expected: MediaKind,
        found: MediaKind,
    },
    #[error("failed to probe {path}: {message}")]
    ProbeFailure { path: PathBuf, message: String },
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("invalid subtitle block {block}: {message}")]
    InvalidSubtitle { block: usize, message: String },
    #[error("io error: {0}")]
    Io(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

impl DocumentError {
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    pub fn probe_failure(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ProbeFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<anyhow::Error> for DocumentError {
    fn from(value: anyhow::Error) -> Self {
        Self::Io(format!("{value:#}"))
    }
}

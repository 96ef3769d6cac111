use std::path::PathBuf;
use thiserror::Error;

/// Advisory errors raised while merging.
///
/// None of these abort a resolution. The engine logs them and keeps the
/// value it already had, so they only surface to callers who use the
/// lower-level building blocks directly.
#[derive(Debug, Error)]
pub enum StagefigError {
    #[error("Cannot parse '{value}' as {kind}: {reason}")]
    Parse {
        kind: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Flag '{flag}' on field '{field}' is reserved")]
    ReservedFlag { field: String, flag: String },
}

impl StagefigError {
    pub(crate) fn parse(kind: &'static str, value: &str, reason: impl ToString) -> Self {
        StagefigError::Parse {
            kind,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

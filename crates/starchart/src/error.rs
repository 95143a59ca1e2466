use thiserror::Error;

use crate::data::reference::ReferenceSource;

/// Failure of an entity lookup.
///
/// Cloneable so a single failed fetch can be handed to every caller
/// waiting on the same cache entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("no data for {0}")]
    NotFound(ReferenceSource),
    #[error("no data for category `{0}`")]
    CategoryNotFound(String),
    #[error("failed to fetch `{path}`: {reason}")]
    Fetch { path: String, reason: String },
    #[error("malformed record {reference}: {reason}")]
    Malformed {
        reference: ReferenceSource,
        reason: String,
    },
    #[error("{reference} is not a {expected}")]
    WrongKind {
        reference: ReferenceSource,
        expected: &'static str,
    },
    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Json(err.to_string())
    }
}

/// Rejected viewport operation or configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("toggle index {index} out of range ({count} toggles)")]
    ToggleOutOfRange { index: usize, count: usize },
    #[error("invalid map config: {0}")]
    Config(String),
}

//! Error types surfaced across the library boundary
//!
//! Only structurally fatal input becomes an error. Unknown item types, bad
//! dependency expressions and unknown keys are logged and recovered locally.

use std::path::PathBuf;

/// Failure to produce a usable preference tree
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Malformed definitions document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Definitions root must be a JSON object")]
    NotAnObject,

    #[error("Definitions document has no '{}' array", crate::constants::document::ITEMS)]
    MissingItems,

    #[error("Definitions loaded but produced no preferences (namespace '{namespace}')")]
    Empty { namespace: String },

    #[error("Preference store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Background load task failed: {0}")]
    Worker(String),
}

/// Failure in a key-value store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read store {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write store {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Store {path:?} is not a valid JSON object: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize store: {0}")]
    Serialize(serde_json::Error),
}

use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;

/// Errors surfaced by the translation store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The caller supplied an argument the operation cannot work with.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutations are refused until the catalog has been loaded once.
    #[error("Catalog has not been loaded yet")]
    NotReady,

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot build document for locale '{locale}': {source}")]
    Codec {
        locale: String,
        #[source]
        source: CodecError,
    },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }
}

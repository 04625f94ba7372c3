//! Parameter store error types.

use std::io;
use std::path::PathBuf;

use errpage_core::ParameterError;
use thiserror::Error;

/// Errors that can occur when loading a parameter document.
///
/// Every variant means "not found" to HTTP clients; the distinction only
/// exists for diagnostics.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The lookup key was empty.
    #[error("Empty lookup key")]
    EmptyKey,

    /// The lookup key is not lower-case word characters only.
    #[error("Invalid lookup key: {0:?}")]
    InvalidKey(String),

    /// No document exists for the key.
    #[error("Document not found: {0}")]
    Missing(PathBuf),

    /// The document exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not a JSON object.
    #[error("Malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: ParameterError,
    },
}

impl StoreError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyKey => "empty_key",
            Self::InvalidKey(_) => "invalid_key",
            Self::Missing(_) => "missing",
            Self::Io { .. } => "io",
            Self::Malformed { .. } => "malformed",
        }
    }
}

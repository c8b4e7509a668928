//! Error types for the cache module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the local cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory could not be created or accessed.
    #[error("Cache storage unavailable at {path}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A staged file could not be committed into the cache.
    #[error("Failed to write {destination} into the cache")]
    StorageWriteError {
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staged file to commit does not exist.
    #[error("Staged file not found: {path}")]
    StagingMissing { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    pub(crate) fn unavailable(path: PathBuf, source: std::io::Error) -> Self {
        Self::StorageUnavailable { path, source }
    }

    pub(crate) fn write_failed(destination: PathBuf, source: std::io::Error) -> Self {
        Self::StorageWriteError {
            destination,
            source,
        }
    }
}

//! Error types for the fetch-or-serve controller.

use thiserror::Error;

use crate::cache::CacheError;
use crate::downloader::DownloadError;
use crate::opener::OpenError;

use super::handle::LocalPdfHandle;

const DOCUMENT_UNAVAILABLE: &str = "PDF file not available";
const FETCH_FAILED: &str = "Failed to open PDF. Please try again.";

/// Errors obtaining a local copy of a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The catalog record has no remote document.
    #[error("Book {book_id} has no document attached")]
    NoDocumentAttached { book_id: String },

    /// The cache directory could not be prepared.
    #[error("Local storage unavailable")]
    StorageUnavailable(#[source] CacheError),

    /// The downloaded file could not be committed into the cache.
    #[error("Failed to store document")]
    StorageWriteError(#[source] CacheError),

    /// The download itself failed.
    #[error("Failed to fetch document")]
    FetchFailed(#[source] DownloadError),
}

impl From<CacheError> for FetchError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::StorageUnavailable { .. } => Self::StorageUnavailable(err),
            other => Self::StorageWriteError(other),
        }
    }
}

impl From<DownloadError> for FetchError {
    fn from(err: DownloadError) -> Self {
        Self::FetchFailed(err)
    }
}

impl FetchError {
    /// Message shown to the user. Storage and transport failures share one.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoDocumentAttached { .. } => DOCUMENT_UNAVAILABLE,
            _ => FETCH_FAILED,
        }
    }

    /// Whether the user can usefully retry the same action.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NoDocumentAttached { .. })
    }
}

/// Errors of the full fetch-then-open flow.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The document is cached but no viewer could open it.
    #[error("Failed to open {}", handle.path.display())]
    Open {
        handle: LocalPdfHandle,
        #[source]
        source: OpenError,
    },
}

impl ReaderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Fetch(e) => e.user_message(),
            Self::Open { source, .. } => source.user_message(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_retryable(),
            Self::Open { source, .. } => source.is_retryable(),
        }
    }

    /// The cached copy, when the failure happened after the fetch.
    pub fn handle(&self) -> Option<&LocalPdfHandle> {
        match self {
            Self::Fetch(_) => None,
            Self::Open { handle, .. } => Some(handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cache_error_mapping() {
        let unavailable = CacheError::StorageUnavailable {
            path: PathBuf::from("/cache"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(matches!(
            FetchError::from(unavailable),
            FetchError::StorageUnavailable(_)
        ));

        let missing = CacheError::StagingMissing {
            path: PathBuf::from("/cache/.staging/a.part"),
        };
        assert!(matches!(
            FetchError::from(missing),
            FetchError::StorageWriteError(_)
        ));
    }

    #[test]
    fn test_user_messages() {
        let missing = FetchError::NoDocumentAttached {
            book_id: "b1".to_string(),
        };
        assert_eq!(missing.user_message(), "PDF file not available");
        assert!(!missing.is_retryable());

        let fetch = FetchError::FetchFailed(DownloadError::Status {
            url: "https://host/f1.pdf".to_string(),
            status: 500,
        });
        assert_eq!(fetch.user_message(), "Failed to open PDF. Please try again.");
        assert!(fetch.is_retryable());

        let reader = ReaderError::from(fetch);
        assert!(reader.handle().is_none());
        assert_eq!(reader.user_message(), "Failed to open PDF. Please try again.");
    }
}

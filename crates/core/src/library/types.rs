use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;
use crate::catalog::{BookRecord, CatalogError};
use crate::config::ReaderConfig;
use crate::reader::{FetchError, LocalPdfHandle, ReaderError};

/// A book in a listing, with its local availability.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookSummary {
    #[serde(flatten)]
    pub book: BookRecord,
    /// Whether a local copy is cached.
    pub downloaded: bool,
}

/// Detail screen data.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookDetails {
    pub book: BookRecord,
    pub downloaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOptions {
    /// Download again even when a cached copy exists.
    #[serde(default)]
    pub force_refresh: bool,
}

/// A successfully opened document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpenOutcome {
    pub handle: LocalPdfHandle,
    pub cache_hit: bool,
}

/// How the reader screen behaves when mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderPolicy {
    pub auto_open_on_mount: bool,
}

impl Default for ReaderPolicy {
    fn default() -> Self {
        Self {
            auto_open_on_mount: true,
        }
    }
}

impl From<&ReaderConfig> for ReaderPolicy {
    fn from(config: &ReaderConfig) -> Self {
        Self {
            auto_open_on_mount: config.auto_open_on_mount,
        }
    }
}

/// State of a mounted reader screen.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReaderStatus {
    /// The document was fetched and handed to a viewer.
    Opened { handle: LocalPdfHandle },
    /// Auto-open failed; the screen offers a retry.
    Failed { message: String, retryable: bool },
    /// Waiting for the user to open the document.
    Ready,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReaderView {
    pub book: BookRecord,
    #[serde(flatten)]
    pub status: ReaderStatus,
}

/// Errors from library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<FetchError> for LibraryError {
    fn from(err: FetchError) -> Self {
        Self::Reader(ReaderError::Fetch(err))
    }
}

impl LibraryError {
    /// Message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) => "Book not found",
            Self::Catalog(_) => "Failed to load books",
            Self::Reader(e) => e.user_message(),
            Self::Cache(_) => "Failed to update local storage",
        }
    }
}

//! Remote catalog client.
//!
//! Book metadata lives in a hosted document database and the PDF binaries
//! in its object storage. This module exposes two seams over that backend:
//!
//! - [`Catalog`]: the read-only surface used by the library screens
//!   (list, get, search), returning normalized [`BookRecord`]s.
//! - [`BackendStore`]: the privileged surface used by the thumbnail
//!   generator and maintenance jobs (raw documents, file storage, updates).
//!
//! [`AppwriteClient`] implements both over the backend's REST API.

mod appwrite;
mod types;

pub use appwrite::AppwriteClient;
pub use types::{BookDocument, BookRecord, FileUrls, StoredFile};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the catalog backend.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Missing or rejected credentials (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl CatalogError {
    /// Whether re-issuing the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::RateLimitExceeded => true,
            Self::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Read-only catalog surface.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List books, most recently added first, bounded by the configured page size.
    async fn list_books(&self) -> Result<Vec<BookRecord>, CatalogError>;

    /// Get a single book by id.
    async fn get_book(&self, id: &str) -> Result<BookRecord, CatalogError>;

    /// Full-text search on title or author.
    async fn search_books(&self, query: &str) -> Result<Vec<BookRecord>, CatalogError>;
}

/// Privileged backend surface: raw documents and object storage.
#[async_trait]
pub trait BackendStore: Send + Sync {
    /// List raw book documents.
    async fn list_book_documents(&self) -> Result<Vec<BookDocument>, CatalogError>;

    /// Find book documents whose `pdfFileId` equals `file_id`.
    async fn find_books_by_pdf_file(&self, file_id: &str)
        -> Result<Vec<BookDocument>, CatalogError>;

    /// Patch attributes of a book document.
    async fn update_book(&self, id: &str, patch: serde_json::Value) -> Result<(), CatalogError>;

    /// Get metadata of a stored file.
    async fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<StoredFile, CatalogError>;

    /// List files in a bucket.
    async fn list_files(&self, bucket_id: &str) -> Result<Vec<StoredFile>, CatalogError>;

    /// Download the contents of a stored file.
    async fn download_file(&self, bucket_id: &str, file_id: &str)
        -> Result<Vec<u8>, CatalogError>;

    /// Upload a new file.
    async fn create_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<StoredFile, CatalogError>;
}

//! Book, reader and cache API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use libris_core::{
    BookDetails, BookSummary, CachedFile, CatalogError, FetchError, LibraryError, OpenOptions,
    OpenOutcome, ReaderError, ReaderView,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::handlers::{ApiError, ErrorResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenParams {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub books: Vec<BookSummary>,
    pub total: usize,
}

impl From<Vec<BookSummary>> for BookListResponse {
    fn from(books: Vec<BookSummary>) -> Self {
        Self {
            total: books.len(),
            books,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RemoveCacheResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheListResponse {
    pub documents: Vec<CachedFile>,
    pub total: usize,
    pub total_bytes: u64,
}

// ============================================================================
// Error mapping
// ============================================================================

fn status_for(err: &LibraryError) -> StatusCode {
    match err {
        LibraryError::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
        LibraryError::Catalog(_) => StatusCode::BAD_GATEWAY,
        LibraryError::Reader(ReaderError::Fetch(FetchError::NoDocumentAttached { .. })) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LibraryError::Reader(ReaderError::Fetch(_)) => StatusCode::BAD_GATEWAY,
        LibraryError::Reader(ReaderError::Open { .. }) => StatusCode::CONFLICT,
        LibraryError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn library_error(err: LibraryError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        warn!(status = status.as_u16(), "Library request failed: {}", err);
    }

    let mut body = ErrorResponse::new(err.user_message(), &err);
    if let LibraryError::Reader(reader) = &err {
        body.handle = reader.handle().cloned();
    }
    (status, Json(body))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/books
///
/// List books, optionally filtered by language.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookListResponse>, ApiError> {
    let language = params.language.as_deref().filter(|l| !l.trim().is_empty());
    state
        .library()
        .list_books(language)
        .await
        .map(|books| Json(books.into()))
        .map_err(library_error)
}

/// GET /api/v1/books/search
pub async fn search_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<BookListResponse>, ApiError> {
    state
        .library()
        .search_books(&params.q)
        .await
        .map(|books| Json(books.into()))
        .map_err(library_error)
}

/// GET /api/v1/languages
pub async fn list_languages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LanguagesResponse>, ApiError> {
    let languages = state.library().languages().await.map_err(library_error)?;
    Ok(Json(LanguagesResponse { languages }))
}

/// GET /api/v1/books/{id}
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookDetails>, ApiError> {
    state
        .library()
        .book_details(&id)
        .await
        .map(Json)
        .map_err(library_error)
}

/// POST /api/v1/books/{id}/open
///
/// Serve the cached copy or download it, then hand it to a viewer.
/// `?refresh=true` downloads again even when a copy is cached.
pub async fn open_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<OpenParams>,
) -> Result<Json<OpenOutcome>, ApiError> {
    let options = OpenOptions {
        force_refresh: params.refresh,
    };
    state
        .library()
        .open_book(&id, options)
        .await
        .map(Json)
        .map_err(library_error)
}

/// GET /api/v1/books/{id}/reader
pub async fn mount_reader(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReaderView>, ApiError> {
    state
        .library()
        .mount_reader(&id)
        .await
        .map(Json)
        .map_err(library_error)
}

/// DELETE /api/v1/books/{id}/cache
pub async fn remove_cached_copy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RemoveCacheResponse>, ApiError> {
    let removed = state
        .library()
        .remove_local_copy(&id)
        .await
        .map_err(library_error)?;
    Ok(Json(RemoveCacheResponse { removed }))
}

/// GET /api/v1/cache
pub async fn list_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheListResponse>, ApiError> {
    let documents = state
        .library()
        .cached_documents()
        .await
        .map_err(library_error)?;
    Ok(Json(CacheListResponse {
        total: documents.len(),
        total_bytes: documents.iter().map(|d| d.size_bytes).sum(),
        documents,
    }))
}

//! Mock catalog for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{BookRecord, Catalog, CatalogError};

/// Mock implementation of the Catalog trait.
///
/// Serves a fixed list of records. Search matches title or author
/// case-insensitively.
#[derive(Debug, Default)]
pub struct MockCatalog {
    books: Arc<RwLock<Vec<BookRecord>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
    request_count: Arc<RwLock<usize>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog contents.
    pub async fn set_books(&self, books: Vec<BookRecord>) {
        *self.books.write().await = books;
    }

    /// Add a single record.
    pub async fn add_book(&self, book: BookRecord) {
        self.books.write().await.push(book);
    }

    /// Configure the next request to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Number of requests served, including failed ones.
    pub async fn request_count(&self) -> usize {
        *self.request_count.read().await
    }

    async fn begin(&self) -> Result<(), CatalogError> {
        *self.request_count.write().await += 1;
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn list_books(&self) -> Result<Vec<BookRecord>, CatalogError> {
        self.begin().await?;
        Ok(self.books.read().await.clone())
    }

    async fn get_book(&self, id: &str) -> Result<BookRecord, CatalogError> {
        self.begin().await?;
        self.books
            .read()
            .await
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("Book {}", id)))
    }

    async fn search_books(&self, query: &str) -> Result<Vec<BookRecord>, CatalogError> {
        self.begin().await?;
        let query = query.to_lowercase();
        Ok(self
            .books
            .read()
            .await
            .iter()
            .filter(|b| {
                b.title.to_lowercase().contains(&query) || b.author.to_lowercase().contains(&query)
            })
            .cloned()
            .collect())
    }
}

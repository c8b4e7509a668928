//! Mock backend store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{BackendStore, BookDocument, CatalogError, StoredFile};

/// A recorded document update for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpdate {
    pub book_id: String,
    pub patch: serde_json::Value,
}

/// Mock implementation of the BackendStore trait.
///
/// Keeps documents and files in memory. Updates are applied to the stored
/// documents so follow-up reads see them.
#[derive(Debug, Default)]
pub struct MockBackendStore {
    documents: Arc<RwLock<Vec<BookDocument>>>,
    /// Files keyed by (bucket, id).
    files: Arc<RwLock<HashMap<(String, String), (StoredFile, Vec<u8>)>>>,
    updates: Arc<RwLock<Vec<RecordedUpdate>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockBackendStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_document(&self, doc: BookDocument) {
        self.documents.write().await.push(doc);
    }

    pub async fn add_file(&self, file: StoredFile, content: Vec<u8>) {
        let key = (file.bucket_id.clone(), file.id.clone());
        self.files.write().await.insert(key, (file, content));
    }

    /// Current state of a document.
    pub async fn document(&self, id: &str) -> Option<BookDocument> {
        self.documents
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Metadata of a stored file.
    pub async fn file(&self, bucket_id: &str, file_id: &str) -> Option<StoredFile> {
        self.files
            .read()
            .await
            .get(&(bucket_id.to_string(), file_id.to_string()))
            .map(|(file, _)| file.clone())
    }

    /// All updates applied so far.
    pub async fn recorded_updates(&self) -> Vec<RecordedUpdate> {
        self.updates.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Result<(), CatalogError> {
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn apply_patch(doc: &BookDocument, patch: &serde_json::Value) -> Result<BookDocument, CatalogError> {
    let parse_err = |e: serde_json::Error| CatalogError::ParseError(e.to_string());
    let mut value = serde_json::to_value(doc).map_err(parse_err)?;
    if let (Some(target), Some(fields)) = (value.as_object_mut(), patch.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value).map_err(parse_err)
}

#[async_trait]
impl BackendStore for MockBackendStore {
    async fn list_book_documents(&self) -> Result<Vec<BookDocument>, CatalogError> {
        self.take_error().await?;
        Ok(self.documents.read().await.clone())
    }

    async fn find_books_by_pdf_file(
        &self,
        file_id: &str,
    ) -> Result<Vec<BookDocument>, CatalogError> {
        self.take_error().await?;
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .filter(|d| d.pdf_file_id.as_deref() == Some(file_id))
            .cloned()
            .collect())
    }

    async fn update_book(&self, id: &str, patch: serde_json::Value) -> Result<(), CatalogError> {
        self.take_error().await?;
        let mut documents = self.documents.write().await;
        let doc = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| CatalogError::NotFound(format!("Book {}", id)))?;
        *doc = apply_patch(doc, &patch)?;

        self.updates.write().await.push(RecordedUpdate {
            book_id: id.to_string(),
            patch,
        });
        Ok(())
    }

    async fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<StoredFile, CatalogError> {
        self.take_error().await?;
        self.file(bucket_id, file_id)
            .await
            .ok_or_else(|| CatalogError::NotFound(format!("File {}", file_id)))
    }

    async fn list_files(&self, bucket_id: &str) -> Result<Vec<StoredFile>, CatalogError> {
        self.take_error().await?;
        let mut files: Vec<StoredFile> = self
            .files
            .read()
            .await
            .values()
            .filter(|(f, _)| f.bucket_id == bucket_id)
            .map(|(f, _)| f.clone())
            .collect();
        files.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(files)
    }

    async fn download_file(
        &self,
        bucket_id: &str,
        file_id: &str,
    ) -> Result<Vec<u8>, CatalogError> {
        self.take_error().await?;
        self.files
            .read()
            .await
            .get(&(bucket_id.to_string(), file_id.to_string()))
            .map(|(_, content)| content.clone())
            .ok_or_else(|| CatalogError::NotFound(format!("File {}", file_id)))
    }

    async fn create_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<StoredFile, CatalogError> {
        self.take_error().await?;
        let file = StoredFile {
            id: file_id.to_string(),
            bucket_id: bucket_id.to_string(),
            name: name.to_string(),
            mime_type: Some(mime_type.to_string()),
            size_bytes: bytes.len() as u64,
        };
        self.add_file(file.clone(), bytes).await;
        Ok(file)
    }
}

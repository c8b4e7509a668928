//! REST client for the hosted backend (Appwrite API).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::{BackendConfig, CatalogConfig};
use crate::metrics::BACKEND_REQUEST_DURATION;

use super::types::{BookDocument, BookRecord, FileUrls, StoredFile};
use super::{BackendStore, Catalog, CatalogError};

/// Backend REST client.
pub struct AppwriteClient {
    client: Client,
    endpoint: String,
    project_id: String,
    database_id: String,
    collection_id: String,
    api_key: Option<String>,
    urls: FileUrls,
    page_size: u32,
    search_limit: u32,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<BookDocument>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    files: Vec<StoredFile>,
}

impl AppwriteClient {
    /// Create a new client.
    pub fn new(backend: &BackendConfig, catalog: &CatalogConfig) -> Result<Self, CatalogError> {
        if backend.endpoint.is_empty() || backend.project_id.is_empty() {
            return Err(CatalogError::NotConfigured(
                "backend endpoint and project id are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(backend.timeout_secs as u64))
            .build()?;

        let endpoint = backend.endpoint.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            urls: FileUrls::new(&endpoint, &backend.project_id, &backend.storage_bucket_id),
            endpoint,
            project_id: backend.project_id.clone(),
            database_id: backend.database_id.clone(),
            collection_id: backend.books_collection_id.clone(),
            api_key: backend.api_key.clone().filter(|k| !k.is_empty()),
            page_size: catalog.page_size,
            search_limit: catalog.search_limit,
        })
    }

    /// URL builder for stored files.
    pub fn file_urls(&self) -> &FileUrls {
        &self.urls
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint,
            urlencoding::encode(&self.database_id),
            urlencoding::encode(&self.collection_id)
        )
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.documents_url(), urlencoding::encode(id))
    }

    fn files_url(&self, bucket_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files",
            self.endpoint,
            urlencoding::encode(bucket_id)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("X-Appwrite-Project", &self.project_id);
        match &self.api_key {
            Some(key) => request.header("X-Appwrite-Key", key),
            None => request,
        }
    }

    fn require_api_key(&self) -> Result<(), CatalogError> {
        if self.api_key.is_none() {
            return Err(CatalogError::NotConfigured(
                "backend.api_key is required for this operation".to_string(),
            ));
        }
        Ok(())
    }

    /// Send a request and map non-success statuses to catalog errors.
    async fn send(
        &self,
        operation: &str,
        subject: &str,
        request: RequestBuilder,
    ) -> Result<Response, CatalogError> {
        let start = Instant::now();
        let result = self.send_inner(subject, request).await;
        let label = if result.is_ok() { "ok" } else { "error" };
        BACKEND_REQUEST_DURATION
            .with_label_values(&[operation, label])
            .observe(start.elapsed().as_secs_f64());
        result
    }

    async fn send_inner(
        &self,
        subject: &str,
        request: RequestBuilder,
    ) -> Result<Response, CatalogError> {
        let response = self.authorized(request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            404 => Err(CatalogError::NotFound(subject.to_string())),
            401 | 403 => Err(CatalogError::Unauthorized(body)),
            429 => Err(CatalogError::RateLimitExceeded),
            code => Err(CatalogError::ApiError {
                status: code,
                message: body,
            }),
        }
    }

    async fn query_documents(
        &self,
        operation: &str,
        queries: Vec<serde_json::Value>,
    ) -> Result<Vec<BookDocument>, CatalogError> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_string()))
            .collect();

        let request = self.client.get(self.documents_url()).query(&params);
        let response = self.send(operation, "documents", request).await?;

        let list: DocumentList = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse document list: {}", e))
        })?;

        Ok(list.documents)
    }

    fn normalize_all(&self, docs: Vec<BookDocument>) -> Vec<BookRecord> {
        docs.into_iter().map(|d| self.urls.normalize(d)).collect()
    }
}

fn order_desc(attribute: &str) -> serde_json::Value {
    json!({ "method": "orderDesc", "attribute": attribute })
}

fn limit(n: u32) -> serde_json::Value {
    json!({ "method": "limit", "values": [n] })
}

fn search(attribute: &str, value: &str) -> serde_json::Value {
    json!({ "method": "search", "attribute": attribute, "values": [value] })
}

fn equal(attribute: &str, value: &str) -> serde_json::Value {
    json!({ "method": "equal", "attribute": attribute, "values": [value] })
}

fn or(queries: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "method": "or", "values": queries })
}

#[async_trait]
impl Catalog for AppwriteClient {
    async fn list_books(&self) -> Result<Vec<BookRecord>, CatalogError> {
        debug!("Listing books (limit {})", self.page_size);

        let docs = self
            .query_documents(
                "list_books",
                vec![order_desc("$createdAt"), limit(self.page_size)],
            )
            .await?;

        Ok(self.normalize_all(docs))
    }

    async fn get_book(&self, id: &str) -> Result<BookRecord, CatalogError> {
        debug!(book_id = %id, "Fetching book");

        let request = self.client.get(self.document_url(id));
        let response = self
            .send("get_book", &format!("Book {}", id), request)
            .await?;

        let doc: BookDocument = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse book document: {}", e))
        })?;

        Ok(self.urls.normalize(doc))
    }

    async fn search_books(&self, query: &str) -> Result<Vec<BookRecord>, CatalogError> {
        debug!("Searching books: query='{}'", query);

        let docs = self
            .query_documents(
                "search_books",
                vec![
                    or(vec![search("title", query), search("author", query)]),
                    limit(self.search_limit),
                ],
            )
            .await?;

        Ok(self.normalize_all(docs))
    }
}

#[async_trait]
impl BackendStore for AppwriteClient {
    async fn list_book_documents(&self) -> Result<Vec<BookDocument>, CatalogError> {
        self.query_documents("list_documents", vec![limit(self.page_size)])
            .await
    }

    async fn find_books_by_pdf_file(
        &self,
        file_id: &str,
    ) -> Result<Vec<BookDocument>, CatalogError> {
        self.query_documents("find_by_pdf", vec![equal("pdfFileId", file_id)])
            .await
    }

    async fn update_book(&self, id: &str, patch: serde_json::Value) -> Result<(), CatalogError> {
        self.require_api_key()?;
        debug!(book_id = %id, "Updating book document");

        let request = self
            .client
            .patch(self.document_url(id))
            .json(&json!({ "data": patch }));
        self.send("update_book", &format!("Book {}", id), request)
            .await?;

        Ok(())
    }

    async fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<StoredFile, CatalogError> {
        let url = format!("{}/{}", self.files_url(bucket_id), urlencoding::encode(file_id));
        let response = self
            .send("get_file", &format!("File {}", file_id), self.client.get(url))
            .await?;

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(format!("Failed to parse file: {}", e)))
    }

    async fn list_files(&self, bucket_id: &str) -> Result<Vec<StoredFile>, CatalogError> {
        let request = self
            .client
            .get(self.files_url(bucket_id))
            .query(&[("queries[]", limit(self.page_size).to_string())]);
        let response = self.send("list_files", "files", request).await?;

        let list: FileList = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse file list: {}", e))
        })?;

        Ok(list.files)
    }

    async fn download_file(
        &self,
        bucket_id: &str,
        file_id: &str,
    ) -> Result<Vec<u8>, CatalogError> {
        let url = format!(
            "{}/{}/download",
            self.files_url(bucket_id),
            urlencoding::encode(file_id)
        );
        let response = self
            .send("download_file", &format!("File {}", file_id), self.client.get(url))
            .await?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn create_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<StoredFile, CatalogError> {
        self.require_api_key()?;
        debug!(file_id = %file_id, name = %name, size = bytes.len(), "Uploading file");

        let part = multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(mime_type)?;
        let form = multipart::Form::new()
            .text("fileId", file_id.to_string())
            .part("file", part);

        let request = self.client.post(self.files_url(bucket_id)).multipart(form);
        let response = self.send("create_file", name, request).await?;

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(format!("Failed to parse created file: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> BackendConfig {
        BackendConfig {
            endpoint: "https://cloud.example.com/v1/".to_string(),
            project_id: "proj".to_string(),
            database_id: "db".to_string(),
            books_collection_id: "books".to_string(),
            storage_bucket_id: "bucket".to_string(),
            api_key: Some(String::new()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_urls() {
        let client = AppwriteClient::new(&backend(), &CatalogConfig::default()).unwrap();
        assert_eq!(
            client.documents_url(),
            "https://cloud.example.com/v1/databases/db/collections/books/documents"
        );
        assert_eq!(
            client.document_url("a b"),
            "https://cloud.example.com/v1/databases/db/collections/books/documents/a%20b"
        );
        assert_eq!(
            client.files_url("bucket"),
            "https://cloud.example.com/v1/storage/buckets/bucket/files"
        );
    }

    #[test]
    fn test_empty_api_key_is_treated_as_missing() {
        let client = AppwriteClient::new(&backend(), &CatalogConfig::default()).unwrap();
        assert!(matches!(
            client.require_api_key(),
            Err(CatalogError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let mut config = backend();
        config.endpoint = String::new();
        let result = AppwriteClient::new(&config, &CatalogConfig::default());
        assert!(matches!(result, Err(CatalogError::NotConfigured(_))));
    }

    #[test]
    fn test_query_shapes() {
        let q = or(vec![search("title", "shifa"), search("author", "shifa")]);
        assert_eq!(q["method"], "or");
        assert_eq!(q["values"][0]["attribute"], "title");
        assert_eq!(limit(100)["values"][0], 100);
        assert_eq!(equal("pdfFileId", "f1")["values"][0], "f1");
        assert_eq!(order_desc("$createdAt")["method"], "orderDesc");
    }
}

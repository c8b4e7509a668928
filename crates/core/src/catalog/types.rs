//! Catalog record types.
//!
//! `BookDocument` is the loosely-typed document as stored by the backend.
//! `BookRecord` is the normalized record the rest of the crate works with;
//! the conversion between the two happens once, in [`FileUrls::normalize`].

use serde::{Deserialize, Serialize};

/// A normalized catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookRecord {
    /// Opaque, stable identifier unique within the catalog.
    pub id: String,
    /// Display name. Also the seed for the local cache filename.
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Absolute URL of the PDF binary. `None` when no document is attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    /// Resolved cover image URL. `None` means the client shows a placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    /// Storage file id of the cover thumbnail, when one was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_id: Option<String>,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl BookRecord {
    /// The document URL, if the record has a non-empty one.
    pub fn document_url(&self) -> Option<&str> {
        self.remote_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Whether a PDF binary is attached to this record.
    pub fn has_document(&self) -> bool {
        self.document_url().is_some()
    }
}

/// A book document as returned by the backend REST API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BookDocument {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "pdfFileId", default, skip_serializing_if = "Option::is_none")]
    pub pdf_file_id: Option<String>,
    #[serde(rename = "coverImageId", default, skip_serializing_if = "Option::is_none")]
    pub cover_image_id: Option<String>,
    /// Legacy absolute cover URL.
    #[serde(rename = "coverImage", default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Metadata of a file held in object storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "bucketId")]
    pub bucket_id: String,
    pub name: String,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "sizeOriginal", default)]
    pub size_bytes: u64,
}

/// Builds public storage URLs for file ids.
#[derive(Debug, Clone)]
pub struct FileUrls {
    endpoint: String,
    project_id: String,
    bucket_id: String,
}

impl FileUrls {
    pub fn new(endpoint: &str, project_id: &str, bucket_id: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            bucket_id: bucket_id.to_string(),
        }
    }

    /// Inline view URL for a stored file.
    pub fn view_url(&self, file_id: &str) -> String {
        self.file_url(file_id, "view")
    }

    /// Attachment download URL for a stored file.
    pub fn download_url(&self, file_id: &str) -> String {
        self.file_url(file_id, "download")
    }

    fn file_url(&self, file_id: &str, action: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/{}?project={}",
            self.endpoint,
            urlencoding::encode(&self.bucket_id),
            urlencoding::encode(file_id),
            action,
            urlencoding::encode(&self.project_id),
        )
    }

    /// Turn a raw backend document into a normalized record.
    pub fn normalize(&self, doc: BookDocument) -> BookRecord {
        let cover_image_id = non_empty(doc.cover_image_id);
        let cover_image_url = match &cover_image_id {
            Some(id) => Some(self.view_url(id)),
            None => non_empty(doc.cover_image),
        };

        BookRecord {
            remote_url: non_empty(doc.pdf_file_id).map(|id| self.view_url(&id)),
            cover_image_url,
            cover_image_id,
            id: doc.id,
            title: doc.title,
            author: doc.author,
            description: doc.description.unwrap_or_default(),
            page_count: doc.pages.unwrap_or(0),
            language: non_empty(doc.language),
            genre: non_empty(doc.genre),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> FileUrls {
        FileUrls::new("https://cloud.example.com/v1/", "proj", "books")
    }

    #[test]
    fn test_view_url() {
        assert_eq!(
            urls().view_url("f1"),
            "https://cloud.example.com/v1/storage/buckets/books/files/f1/view?project=proj"
        );
        assert!(urls().download_url("f1").contains("/files/f1/download?"));
    }

    #[test]
    fn test_normalize_full_document() {
        let doc: BookDocument = serde_json::from_value(serde_json::json!({
            "$id": "b1",
            "$createdAt": "2025-01-01T00:00:00.000+00:00",
            "title": "Ash-Shifa Shareef",
            "author": "Qadi Iyad",
            "description": "The healing",
            "pdfFileId": "f1",
            "coverImageId": "c1",
            "pages": 412,
            "genre": "Islamic Literature",
            "language": "Arabic"
        }))
        .unwrap();

        let book = urls().normalize(doc);
        assert_eq!(book.id, "b1");
        assert_eq!(book.page_count, 412);
        assert!(book.remote_url.unwrap().contains("/files/f1/view"));
        assert!(book.cover_image_url.unwrap().contains("/files/c1/view"));
        assert_eq!(book.language.as_deref(), Some("Arabic"));
    }

    #[test]
    fn test_normalize_sparse_document() {
        let doc: BookDocument = serde_json::from_value(serde_json::json!({
            "$id": "b2",
            "title": "Untitled",
            "author": "Unknown",
            "pdfFileId": "",
            "coverImage": "https://img.example.com/legacy.jpg",
            "language": ""
        }))
        .unwrap();

        let book = urls().normalize(doc);
        assert!(book.remote_url.is_none());
        assert!(!book.has_document());
        assert_eq!(book.description, "");
        assert_eq!(book.page_count, 0);
        assert_eq!(
            book.cover_image_url.as_deref(),
            Some("https://img.example.com/legacy.jpg")
        );
        assert!(book.language.is_none());
    }

    #[test]
    fn test_document_url_ignores_blank() {
        let mut book = urls().normalize(BookDocument {
            id: "b3".to_string(),
            ..Default::default()
        });
        book.remote_url = Some("   ".to_string());
        assert!(book.document_url().is_none());
    }
}

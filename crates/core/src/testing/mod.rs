//! Testing utilities and mock implementations.
//!
//! Controllable doubles for every external seam (catalog, backend store,
//! downloader, opener, rasterizer), so the controller, library service and
//! HTTP API can be exercised without network access or a PDF viewer.
//!
//! # Example
//!
//! ```rust,ignore
//! use libris_core::testing::{fixtures, MockCatalog, MockDownloader};
//!
//! let catalog = MockCatalog::new();
//! catalog.set_books(vec![fixtures::book("b1", "Ash-Shifa Shareef!", "https://host/f1.pdf")]).await;
//!
//! let downloader = MockDownloader::new();
//! // ... build a FetchOrServe and LibraryService around them
//! assert_eq!(downloader.call_count().await, 1);
//! ```

mod mock_backend_store;
mod mock_catalog;
mod mock_downloader;
mod mock_opener;
mod mock_rasterizer;

pub use mock_backend_store::{MockBackendStore, RecordedUpdate};
pub use mock_catalog::MockCatalog;
pub use mock_downloader::{MockDownloader, RecordedDownload};
pub use mock_opener::MockOpener;
pub use mock_rasterizer::MockRasterizer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{BookDocument, BookRecord, StoredFile};

    /// A catalog record. An empty `url` means no document is attached.
    pub fn book(id: &str, title: &str, url: &str) -> BookRecord {
        BookRecord {
            id: id.to_string(),
            title: title.to_string(),
            author: "Unknown".to_string(),
            description: String::new(),
            remote_url: (!url.is_empty()).then(|| url.to_string()),
            cover_image_url: None,
            cover_image_id: None,
            page_count: 0,
            language: None,
            genre: None,
        }
    }

    /// A raw backend document.
    pub fn document(id: &str, title: &str, pdf_file_id: Option<&str>) -> BookDocument {
        BookDocument {
            id: id.to_string(),
            title: title.to_string(),
            author: "Unknown".to_string(),
            pdf_file_id: pdf_file_id.map(str::to_string),
            ..Default::default()
        }
    }

    /// Metadata of a stored file.
    pub fn stored_file(id: &str, bucket_id: &str, name: &str) -> StoredFile {
        StoredFile {
            id: id.to_string(),
            bucket_id: bucket_id.to_string(),
            name: name.to_string(),
            mime_type: None,
            size_bytes: 0,
        }
    }
}

//! Storage event handler and maintenance jobs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::json;
use tokio::fs;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::{BackendStore, BookDocument};
use crate::metrics::THUMBNAILS_TOTAL;

use super::config::ThumbnailConfig;
use super::error::ThumbnailError;
use super::rasterizer::Rasterizer;
use super::types::{
    pdf_name_for_thumbnail, ReconcileReport, StorageEvent, ThumbnailOutcome, ThumbnailSpec,
};

/// Substring identifying stock placeholder cover URLs.
pub const PLACEHOLDER_COVER_MARKER: &str = "picsum.photos";

const THUMBNAIL_MIME_TYPE: &str = "image/jpeg";
const INVALID_PAYLOAD: &str = "Invalid event payload";
const NOT_A_PDF: &str = "Not a PDF file";
const FOREIGN_BUCKET: &str = "Event is not for the configured bucket";
const RECONCILE_CONCURRENCY: usize = 4;

/// Generates cover thumbnails for uploaded PDFs.
pub struct ThumbnailGenerator {
    store: Arc<dyn BackendStore>,
    rasterizer: Arc<dyn Rasterizer>,
    spec: ThumbnailSpec,
    temp_dir: PathBuf,
    bucket_id: String,
}

impl ThumbnailGenerator {
    /// `bucket_id` is the only bucket events are accepted for and the one
    /// scanned by [`reconcile`](Self::reconcile).
    pub fn new(
        store: Arc<dyn BackendStore>,
        rasterizer: Arc<dyn Rasterizer>,
        config: &ThumbnailConfig,
        bucket_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            rasterizer,
            spec: config.spec(),
            temp_dir: config.temp_dir.clone(),
            bucket_id: bucket_id.into(),
        }
    }

    /// Handle a raw storage event body.
    ///
    /// Never returns an error: every failure is reported in the outcome.
    pub async fn handle_event(&self, body: &str) -> ThumbnailOutcome {
        let outcome = match StorageEvent::parse(body) {
            None => ThumbnailOutcome::Rejected {
                reason: INVALID_PAYLOAD.to_string(),
            },
            Some(event) if event.bucket_id != self.bucket_id => {
                warn!(
                    file_id = %event.file_id,
                    bucket_id = %event.bucket_id,
                    "Ignoring event for foreign bucket"
                );
                ThumbnailOutcome::Skipped {
                    reason: FOREIGN_BUCKET.to_string(),
                }
            }
            Some(event) if !event.is_pdf() => {
                info!("Skipping non-PDF file: {}", event.name);
                ThumbnailOutcome::Skipped {
                    reason: NOT_A_PDF.to_string(),
                }
            }
            Some(event) => match self.generate(&event).await {
                Ok((thumbnail_id, book_id)) => ThumbnailOutcome::Generated {
                    thumbnail_id,
                    book_id,
                },
                Err(e) => {
                    error!(file_id = %event.file_id, "Error generating thumbnail: {}", e);
                    ThumbnailOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            },
        };

        THUMBNAILS_TOTAL.with_label_values(&[outcome.label()]).inc();
        outcome
    }

    async fn generate(
        &self,
        event: &StorageEvent,
    ) -> Result<(String, Option<String>), ThumbnailError> {
        info!(file_id = %event.file_id, "Processing PDF: {}", event.name);

        let pdf = self
            .store
            .download_file(&event.bucket_id, &event.file_id)
            .await?;
        let image = self.render(&pdf).await?;

        let thumbnail_id = Uuid::new_v4().simple().to_string();
        let name = event.thumbnail_name();
        self.store
            .create_file(&event.bucket_id, &thumbnail_id, &name, image, THUMBNAIL_MIME_TYPE)
            .await?;
        info!(thumbnail_id = %thumbnail_id, "Thumbnail uploaded as {}", name);

        let books = self.store.find_books_by_pdf_file(&event.file_id).await?;
        let book_id = match books.first() {
            Some(book) => {
                self.set_cover(&book.id, &thumbnail_id).await?;
                info!(book_id = %book.id, "Updated book cover");
                Some(book.id.clone())
            }
            None => {
                info!("No book document found for PDF file: {}", event.file_id);
                None
            }
        };

        Ok((thumbnail_id, book_id))
    }

    /// Write the PDF to scratch space and render its first page.
    async fn render(&self, pdf: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
        fs::create_dir_all(&self.temp_dir).await?;
        let input = self
            .temp_dir
            .join(format!("{}.pdf", Uuid::new_v4().simple()));
        fs::write(&input, pdf).await?;

        let result = self.rasterizer.render_first_page(&input, &self.spec).await;
        if let Err(e) = fs::remove_file(&input).await {
            warn!("Failed to remove {}: {}", input.display(), e);
        }

        Ok(result?)
    }

    async fn set_cover(&self, book_id: &str, thumbnail_id: &str) -> Result<(), ThumbnailError> {
        self.store
            .update_book(book_id, json!({ "coverImageId": thumbnail_id }))
            .await?;
        Ok(())
    }

    /// Point books at thumbnails already present in storage.
    ///
    /// A thumbnail named `<x>_thumb.png` or `<x>_thumb.jpg` belongs to the
    /// PDF named `<x>.pdf`. Books without a PDF, without a matching
    /// thumbnail, or whose update fails are counted as missing.
    pub async fn reconcile(&self) -> Result<ReconcileReport, ThumbnailError> {
        let books = self.store.list_book_documents().await?;
        let files = self.store.list_files(&self.bucket_id).await?;
        info!(books = books.len(), files = files.len(), "Reconciling thumbnails");

        let thumbnails: HashMap<String, String> = files
            .into_iter()
            .filter_map(|f| pdf_name_for_thumbnail(&f.name).map(|pdf| (pdf, f.id)))
            .collect();

        let results: Vec<bool> = stream::iter(books)
            .map(|book| self.reconcile_book(book, &thumbnails))
            .buffer_unordered(RECONCILE_CONCURRENCY)
            .collect()
            .await;

        let updated = results.iter().filter(|ok| **ok).count();
        let report = ReconcileReport {
            updated,
            missing: results.len() - updated,
        };
        info!(
            updated = report.updated,
            missing = report.missing,
            "Thumbnail reconcile complete"
        );
        Ok(report)
    }

    async fn reconcile_book(&self, book: BookDocument, thumbnails: &HashMap<String, String>) -> bool {
        let Some(pdf_id) = book.pdf_file_id.as_deref().filter(|id| !id.is_empty()) else {
            debug!(book_id = %book.id, "No pdfFileId, skipping");
            return false;
        };

        let file = match self.store.get_file(&self.bucket_id, pdf_id).await {
            Ok(file) => file,
            Err(e) => {
                warn!(book_id = %book.id, "Failed to look up PDF {}: {}", pdf_id, e);
                return false;
            }
        };

        let Some(thumbnail_id) = thumbnails.get(&file.name) else {
            debug!(book_id = %book.id, "No thumbnail found for {}", file.name);
            return false;
        };

        match self.set_cover(&book.id, thumbnail_id).await {
            Ok(()) => {
                info!(book_id = %book.id, thumbnail_id = %thumbnail_id, "Cover updated");
                true
            }
            Err(e) => {
                warn!(book_id = %book.id, "Failed to update cover: {}", e);
                false
            }
        }
    }

    /// Blank legacy `coverImage` URLs containing `marker`. Returns how many
    /// were cleared; individual update failures are logged and skipped.
    pub async fn clear_placeholder_covers(&self, marker: &str) -> Result<usize, ThumbnailError> {
        let books = self.store.list_book_documents().await?;
        let mut cleared = 0;

        for book in books {
            let is_placeholder = book
                .cover_image
                .as_deref()
                .is_some_and(|url| url.contains(marker));
            if !is_placeholder {
                continue;
            }

            match self
                .store
                .update_book(&book.id, json!({ "coverImage": "" }))
                .await
            {
                Ok(()) => {
                    info!(book_id = %book.id, "Cleared placeholder cover");
                    cleared += 1;
                }
                Err(e) => warn!(book_id = %book.id, "Failed to clear cover: {}", e),
            }
        }

        Ok(cleared)
    }
}

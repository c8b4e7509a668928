use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStore};
use crate::catalog::BookRecord;
use crate::downloader::Downloader;
use crate::metrics::{
    CACHE_LOOKUPS, COMMIT_FAILURES, DOWNLOADED_BYTES, DOWNLOADS_TOTAL, DOWNLOAD_DURATION,
};

use super::error::FetchError;
use super::handle::LocalPdfHandle;
use super::inflight::InflightRegistry;

/// Serves documents from the local cache, downloading them on a miss.
pub struct FetchOrServe {
    store: Arc<CacheStore>,
    downloader: Arc<dyn Downloader>,
    inflight: InflightRegistry,
}

impl FetchOrServe {
    pub fn new(store: Arc<CacheStore>, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            store,
            downloader,
            inflight: InflightRegistry::new(),
        }
    }

    /// The cache this controller commits into.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Return a local copy of the book's document, downloading it if needed.
    ///
    /// A record without a document fails before touching the filesystem or
    /// the network. Concurrent misses for the same key share one download.
    pub async fn obtain_local_copy(&self, book: &BookRecord) -> Result<LocalPdfHandle, FetchError> {
        self.fetch(book, false).await
    }

    /// Download the book's document again, replacing any cached copy.
    pub async fn refresh_local_copy(
        &self,
        book: &BookRecord,
    ) -> Result<LocalPdfHandle, FetchError> {
        self.fetch(book, true).await
    }

    async fn fetch(&self, book: &BookRecord, force: bool) -> Result<LocalPdfHandle, FetchError> {
        let url = book
            .document_url()
            .ok_or_else(|| FetchError::NoDocumentAttached {
                book_id: book.id.clone(),
            })?;

        let key = self.store.key_for(book);
        self.store.ensure_directory().await?;

        if !force && self.store.exists(&key) {
            return Ok(self.serve_cached(book, key));
        }

        let slot = self.inflight.slot(&key);
        let _guard = slot.lock().await;

        // Another caller may have committed while we waited for the slot.
        if !force && self.store.exists(&key) {
            return Ok(self.serve_cached(book, key));
        }

        let lookup = if force { "bypass" } else { "miss" };
        CACHE_LOOKUPS.with_label_values(&[lookup]).inc();
        debug!(book_id = %book.id, key = %key, force, "Cache {}", lookup);

        let staged = self.store.staging_path(&key);
        self.download(book, url, &staged).await?;

        let committed = self.store.write(&key, &staged).await.map_err(|e| {
            COMMIT_FAILURES.inc();
            warn!(book_id = %book.id, key = %key, error = %e, "Failed to commit download");
            FetchError::from(e)
        })?;

        info!(
            book_id = %book.id,
            key = %key,
            bytes = committed.size_bytes,
            "Document cached"
        );

        Ok(LocalPdfHandle::new(&self.store, &book.id, key, false))
    }

    fn serve_cached(&self, book: &BookRecord, key: CacheKey) -> LocalPdfHandle {
        CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
        debug!(book_id = %book.id, key = %key, "Cache hit");
        LocalPdfHandle::new(&self.store, &book.id, key, true)
    }

    async fn download(&self, book: &BookRecord, url: &str, staged: &Path) -> Result<u64, FetchError> {
        let start = Instant::now();
        let result = self.downloader.download(url, staged).await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(bytes) => {
                DOWNLOADS_TOTAL.with_label_values(&["completed"]).inc();
                DOWNLOAD_DURATION
                    .with_label_values(&["completed"])
                    .observe(elapsed);
                DOWNLOADED_BYTES.inc_by(bytes);
                debug!(book_id = %book.id, url = %url, bytes, "Download complete");
                Ok(bytes)
            }
            Err(e) => {
                DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
                DOWNLOAD_DURATION.with_label_values(&["failed"]).observe(elapsed);
                warn!(book_id = %book.id, url = %url, error = %e, "Download failed");
                if let Err(rm) = fs::remove_file(staged).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        debug!("Leaving staging file {}: {}", staged.display(), rm);
                    }
                }
                Err(e.into())
            }
        }
    }

    #[cfg(test)]
    fn active_downloads(&self) -> usize {
        self.inflight.active()
    }
}

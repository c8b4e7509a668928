use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::CachedFile;
use crate::catalog::{BookRecord, Catalog};
use crate::metrics::OPENS_TOTAL;
use crate::opener::{OpenError, Opener};
use crate::reader::{FetchError, FetchOrServe, ReaderError};

use super::types::{
    BookDetails, BookSummary, LibraryError, OpenOptions, OpenOutcome, ReaderPolicy, ReaderStatus,
    ReaderView,
};

/// Library operations backing the list, detail and reader screens.
pub struct LibraryService {
    catalog: Arc<dyn Catalog>,
    reader: Arc<FetchOrServe>,
    opener: Arc<dyn Opener>,
    policy: ReaderPolicy,
}

impl LibraryService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        reader: Arc<FetchOrServe>,
        opener: Arc<dyn Opener>,
        policy: ReaderPolicy,
    ) -> Self {
        Self {
            catalog,
            reader,
            opener,
            policy,
        }
    }

    pub fn policy(&self) -> ReaderPolicy {
        self.policy
    }

    /// Recent books, optionally restricted to one language.
    pub async fn list_books(&self, language: Option<&str>) -> Result<Vec<BookSummary>, LibraryError> {
        let books = self.catalog.list_books().await?;
        let books = books
            .into_iter()
            .filter(|b| match language {
                Some(lang) => b.language.as_deref() == Some(lang),
                None => true,
            })
            .collect();
        Ok(self.summarize(books))
    }

    /// Books whose title or author match `query`. A blank query lists everything.
    pub async fn search_books(&self, query: &str) -> Result<Vec<BookSummary>, LibraryError> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_books(None).await;
        }
        debug!("Searching library for '{}'", query);
        let books = self.catalog.search_books(query).await?;
        Ok(self.summarize(books))
    }

    /// Sorted distinct languages of the listed books.
    pub async fn languages(&self) -> Result<Vec<String>, LibraryError> {
        let books = self.catalog.list_books().await?;
        let languages: BTreeSet<String> = books.into_iter().filter_map(|b| b.language).collect();
        Ok(languages.into_iter().collect())
    }

    pub async fn book_details(&self, id: &str) -> Result<BookDetails, LibraryError> {
        let book = self.catalog.get_book(id).await?;
        let store = self.reader.store();
        let key = store.key_for(&book);
        let downloaded = store.exists(&key);

        Ok(BookDetails {
            local_uri: downloaded.then(|| store.uri_of(&key)),
            downloaded,
            book,
        })
    }

    /// Fetch-or-serve the book's document and hand it to a viewer.
    pub async fn open_book(&self, id: &str, options: OpenOptions) -> Result<OpenOutcome, LibraryError> {
        let book = self.catalog.get_book(id).await?;
        Ok(self.open_record(&book, options).await?)
    }

    /// Load the reader screen, opening the document when the policy says so.
    pub async fn mount_reader(&self, id: &str) -> Result<ReaderView, LibraryError> {
        let book = self.catalog.get_book(id).await?;
        if !book.has_document() {
            return Err(FetchError::NoDocumentAttached { book_id: book.id }.into());
        }

        if !self.policy.auto_open_on_mount {
            return Ok(ReaderView {
                book,
                status: ReaderStatus::Ready,
            });
        }

        let status = match self.open_record(&book, OpenOptions::default()).await {
            Ok(outcome) => ReaderStatus::Opened {
                handle: outcome.handle,
            },
            Err(e) => ReaderStatus::Failed {
                message: e.user_message().to_string(),
                retryable: e.is_retryable(),
            },
        };
        Ok(ReaderView { book, status })
    }

    /// Delete the cached copy of a book. Returns whether one existed.
    pub async fn remove_local_copy(&self, id: &str) -> Result<bool, LibraryError> {
        let book = self.catalog.get_book(id).await?;
        let store = self.reader.store();
        let removed = store.remove(&store.key_for(&book)).await?;
        if removed {
            info!(book_id = %id, "Removed cached document");
        }
        Ok(removed)
    }

    /// Documents currently in the local cache.
    pub async fn cached_documents(&self) -> Result<Vec<CachedFile>, LibraryError> {
        Ok(self.reader.store().list().await?)
    }

    async fn open_record(
        &self,
        book: &BookRecord,
        options: OpenOptions,
    ) -> Result<OpenOutcome, ReaderError> {
        let handle = if options.force_refresh {
            self.reader.refresh_local_copy(book).await?
        } else {
            self.reader.obtain_local_copy(book).await?
        };

        let opened = if self.opener.can_open(&handle.uri).await {
            self.opener.open(&handle.uri).await
        } else {
            Err(OpenError::NotOpenable(handle.uri.clone()))
        };

        match opened {
            Ok(()) => {
                OPENS_TOTAL.with_label_values(&["opened"]).inc();
                info!(book_id = %book.id, cache_hit = handle.from_cache, "Document opened");
                Ok(OpenOutcome {
                    cache_hit: handle.from_cache,
                    handle,
                })
            }
            Err(source) => {
                OPENS_TOTAL.with_label_values(&["failed"]).inc();
                warn!(book_id = %book.id, error = %source, "Failed to open document");
                Err(ReaderError::Open { handle, source })
            }
        }
    }

    fn summarize(&self, books: Vec<BookRecord>) -> Vec<BookSummary> {
        let store = self.reader.store();
        books
            .into_iter()
            .map(|book| BookSummary {
                downloaded: store.exists(&store.key_for(&book)),
                book,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, CacheStore};
    use crate::catalog::CatalogError;
    use crate::testing::{fixtures, MockCatalog, MockDownloader, MockOpener};
    use tempfile::TempDir;

    struct Harness {
        catalog: Arc<MockCatalog>,
        downloader: Arc<MockDownloader>,
        opener: Arc<MockOpener>,
        service: LibraryService,
        _temp: TempDir,
    }

    fn harness(policy: ReaderPolicy) -> Harness {
        let temp = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new());
        let downloader = Arc::new(MockDownloader::new());
        let opener = Arc::new(MockOpener::new());
        let store = Arc::new(CacheStore::new(&CacheConfig::at(temp.path())));
        let reader = Arc::new(FetchOrServe::new(store, downloader.clone()));
        let service = LibraryService::new(catalog.clone(), reader, opener.clone(), policy);
        Harness {
            catalog,
            downloader,
            opener,
            service,
            _temp: temp,
        }
    }

    async fn seed(catalog: &MockCatalog) {
        let mut shifa = fixtures::book("b1", "Ash-Shifa Shareef!", "https://host/f1.pdf");
        shifa.language = Some("Arabic".to_string());
        let mut seerat = fixtures::book("b2", "Seerat-e-Mustafa", "https://host/f2.pdf");
        seerat.language = Some("Urdu".to_string());
        let mut empty = fixtures::book("b3", "Coming Soon", "");
        empty.language = Some("Arabic".to_string());
        catalog.set_books(vec![shifa, seerat, empty]).await;
    }

    #[tokio::test]
    async fn test_list_marks_downloaded_books() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;

        h.service.open_book("b1", OpenOptions::default()).await.unwrap();

        let books = h.service.list_books(None).await.unwrap();
        assert_eq!(books.len(), 3);
        assert!(books[0].downloaded);
        assert!(!books[1].downloaded);

        let arabic = h.service.list_books(Some("Arabic")).await.unwrap();
        let ids: Vec<&str> = arabic.iter().map(|s| s.book.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b3"]);
    }

    #[tokio::test]
    async fn test_languages_sorted_and_distinct() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;
        assert_eq!(h.service.languages().await.unwrap(), vec!["Arabic", "Urdu"]);
    }

    #[tokio::test]
    async fn test_blank_search_lists_all() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;

        assert_eq!(h.service.search_books("  ").await.unwrap().len(), 3);
        let found = h.service.search_books("seerat").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].book.id, "b2");
    }

    #[tokio::test]
    async fn test_open_then_reopen_hits_cache() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;

        let first = h.service.open_book("b1", OpenOptions::default()).await.unwrap();
        assert!(!first.cache_hit);
        let second = h.service.open_book("b1", OpenOptions::default()).await.unwrap();
        assert!(second.cache_hit);

        assert_eq!(h.downloader.call_count().await, 1);
        assert_eq!(h.opener.opened_uris().await.len(), 2);

        let details = h.service.book_details("b1").await.unwrap();
        assert!(details.downloaded);
        assert_eq!(details.local_uri.as_deref(), Some(first.handle.uri.as_str()));
    }

    #[tokio::test]
    async fn test_open_failure_keeps_cached_copy() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;
        h.opener
            .set_next_error(OpenError::NoViewer {
                program: "xdg-open".to_string(),
            })
            .await;

        let err = h
            .service
            .open_book("b1", OpenOptions::default())
            .await
            .unwrap_err();
        let LibraryError::Reader(reader_err) = &err else {
            panic!("expected a reader error, got {:?}", err);
        };
        let handle = reader_err.handle().unwrap();
        assert!(handle.path.is_file());
        assert_eq!(err.user_message(), "Unable to open PDF viewer on this device");

        // Retry skips the network
        let retry = h.service.open_book("b1", OpenOptions::default()).await.unwrap();
        assert!(retry.cache_hit);
        assert_eq!(h.downloader.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_unopenable_uri_is_open_failure() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;
        h.opener.set_can_open(false).await;

        let err = h
            .service
            .open_book("b2", OpenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Reader(ReaderError::Open {
                source: OpenError::NotOpenable(_),
                ..
            })
        ));
        assert!(h.opener.opened_uris().await.is_empty());
    }

    #[tokio::test]
    async fn test_mount_reader_auto_opens() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;

        let view = h.service.mount_reader("b2").await.unwrap();
        assert!(matches!(view.status, ReaderStatus::Opened { .. }));
        assert_eq!(h.opener.opened_uris().await.len(), 1);
    }

    #[tokio::test]
    async fn test_mount_reader_without_auto_open() {
        let h = harness(ReaderPolicy {
            auto_open_on_mount: false,
        });
        seed(&h.catalog).await;

        let view = h.service.mount_reader("b2").await.unwrap();
        assert_eq!(view.status, ReaderStatus::Ready);
        assert_eq!(h.downloader.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_mount_reader_reports_fetch_failure() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;
        h.downloader
            .set_next_error(crate::downloader::DownloadError::Transport {
                url: "https://host/f2.pdf".to_string(),
                message: "connection reset".to_string(),
            })
            .await;

        let view = h.service.mount_reader("b2").await.unwrap();
        assert_eq!(
            view.status,
            ReaderStatus::Failed {
                message: "Failed to open PDF. Please try again.".to_string(),
                retryable: true,
            }
        );
    }

    #[tokio::test]
    async fn test_mount_reader_without_document() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;

        let err = h.service.mount_reader("b3").await.unwrap_err();
        assert_eq!(err.user_message(), "PDF file not available");
    }

    #[tokio::test]
    async fn test_unknown_book() {
        let h = harness(ReaderPolicy::default());
        let err = h.service.book_details("nope").await.unwrap_err();
        assert!(matches!(err, LibraryError::Catalog(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_local_copy() {
        let h = harness(ReaderPolicy::default());
        seed(&h.catalog).await;

        assert!(!h.service.remove_local_copy("b1").await.unwrap());
        h.service.open_book("b1", OpenOptions::default()).await.unwrap();
        assert_eq!(h.service.cached_documents().await.unwrap().len(), 1);
        assert!(h.service.remove_local_copy("b1").await.unwrap());
        assert!(!h.service.book_details("b1").await.unwrap().downloaded);
        assert!(h.service.cached_documents().await.unwrap().is_empty());
    }
}

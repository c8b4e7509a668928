//! Mock downloader for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::downloader::{DownloadError, Downloader};

const DEFAULT_CONTENT: &[u8] = b"%PDF-1.7\n% mock document\n%%EOF\n";

/// A recorded download for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedDownload {
    pub url: String,
    pub dest: PathBuf,
    pub success: bool,
}

/// Mock implementation of the Downloader trait.
///
/// Writes configurable bytes to the destination instead of fetching
/// anything. Supports:
/// - failing the next download outright
/// - failing after writing a truncated body
/// - a simulated transfer delay
#[derive(Debug)]
pub struct MockDownloader {
    content: Arc<RwLock<Vec<u8>>>,
    downloads: Arc<RwLock<Vec<RecordedDownload>>>,
    next_error: Arc<RwLock<Option<DownloadError>>>,
    partial_failure: Arc<RwLock<Option<Vec<u8>>>>,
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::with_content(DEFAULT_CONTENT.to_vec())
    }

    /// Create a downloader that serves `content` for every URL.
    pub fn with_content(content: Vec<u8>) -> Self {
        Self {
            content: Arc::new(RwLock::new(content)),
            downloads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            partial_failure: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Change the bytes served by later downloads.
    pub async fn set_content(&self, content: Vec<u8>) {
        *self.content.write().await = content;
    }

    /// Configure the next download to fail with the given error.
    pub async fn set_next_error(&self, error: DownloadError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make the next download write `partial` and then fail.
    pub async fn fail_after_partial(&self, partial: Vec<u8>) {
        *self.partial_failure.write().await = Some(partial);
    }

    /// Delay every download by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all recorded downloads.
    pub async fn recorded_downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.read().await.clone()
    }

    /// Number of downloads attempted.
    pub async fn call_count(&self) -> usize {
        self.downloads.read().await.len()
    }

    async fn record(&self, url: &str, dest: &Path, success: bool) {
        self.downloads.write().await.push(RecordedDownload {
            url: url.to_string(),
            dest: dest.to_path_buf(),
            success,
        });
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            self.record(url, dest, false).await;
            return Err(err);
        }

        let io_err = |source| DownloadError::Io {
            path: dest.to_path_buf(),
            source,
        };

        if let Some(partial) = self.partial_failure.write().await.take() {
            tokio::fs::write(dest, &partial).await.map_err(io_err)?;
            self.record(url, dest, false).await;
            return Err(DownloadError::Transport {
                url: url.to_string(),
                message: "connection reset by peer".to_string(),
            });
        }

        let content = self.content.read().await.clone();
        tokio::fs::write(dest, &content).await.map_err(io_err)?;
        self.record(url, dest, true).await;
        Ok(content.len() as u64)
    }
}

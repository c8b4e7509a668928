//! Remote document download.
//!
//! A [`Downloader`] fetches one URL into one local file. It makes a single
//! attempt; retrying is left to the caller. Writing into `dest` truncates
//! any previous content, so re-invoking with the same URL and destination
//! is safe.

mod http;

pub use http::HttpDownloader;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while downloading a document.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connection, TLS or body transfer failure.
    #[error("Transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("Server returned {status} for {url}")]
    Status { url: String, status: u16 },

    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to write the downloaded bytes locally.
    #[error("Failed to write download to {path}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Whether a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidUrl(_) => false,
            Self::Io { .. } => true,
        }
    }
}

/// Fetches remote documents into local files.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Download `url` into `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

//! HTTP downloader.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::{DownloadError, Downloader};

const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Streams documents over HTTP(S) with a plain GET.
///
/// Only the connection is bounded by a timeout; a transfer may take as
/// long as the server keeps sending.
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Create a downloader with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| DownloadError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Create a downloader around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn transport(url: &str, e: reqwest::Error) -> DownloadError {
    DownloadError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    fn name(&self) -> &str {
        "http"
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let io_err = |source: std::io::Error| DownloadError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let file = File::create(dest).await.map_err(io_err)?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let mut total_bytes = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(|e| transport(url, e))? {
            writer.write_all(&chunk).await.map_err(io_err)?;
            total_bytes += chunk.len() as u64;
        }

        writer.flush().await.map_err(io_err)?;
        writer.get_ref().sync_all().await.map_err(io_err)?;

        debug!(url = %url, bytes = total_bytes, "Download finished");
        Ok(total_bytes)
    }
}

//! Filesystem-backed cache store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::catalog::BookRecord;

use super::config::{CacheConfig, KeyStrategy};
use super::error::CacheError;
use super::key::CacheKey;

const STAGING_EXTENSION: &str = "part";
const PARTIAL_EXTENSION: &str = "partial";

/// A document present in the cache.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CachedFile {
    pub key: CacheKey,
    pub path: PathBuf,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// Maps cache keys to files in a single cache directory.
///
/// The store is the only owner of the files it manages; callers only
/// ever receive paths or URIs.
#[derive(Debug, Clone)]
pub struct CacheStore {
    directory: PathBuf,
    staging_directory: PathBuf,
    key_strategy: KeyStrategy,
}

impl CacheStore {
    /// Creates a store from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            directory: absolute(config.directory()),
            staging_directory: absolute(config.staging_directory()),
            key_strategy: config.key_strategy,
        }
    }

    /// The cache directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The staging directory.
    pub fn staging_directory(&self) -> &Path {
        &self.staging_directory
    }

    /// Derive the cache key for a catalog record.
    pub fn key_for(&self, book: &BookRecord) -> CacheKey {
        CacheKey::for_book(book, self.key_strategy)
    }

    /// Create the cache and staging directories if absent. Idempotent.
    pub async fn ensure_directory(&self) -> Result<(), CacheError> {
        for dir in [&self.directory, &self.staging_directory] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| CacheError::unavailable(dir.clone(), e))?;
        }
        Ok(())
    }

    /// Whether a committed file exists for `key`. Absence is not an error.
    pub fn exists(&self, key: &CacheKey) -> bool {
        self.location_of(key).is_file()
    }

    /// Canonical location for `key`, whether or not the file exists.
    pub fn location_of(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(key.as_str())
    }

    /// `file://` URI of the canonical location for `key`.
    pub fn uri_of(&self, key: &CacheKey) -> String {
        file_uri(&self.location_of(key))
    }

    /// Where a download for `key` is staged.
    ///
    /// The path is deterministic, so an abandoned staging file is simply
    /// overwritten by the next attempt for the same key.
    pub fn staging_path(&self, key: &CacheKey) -> PathBuf {
        self.staging_directory
            .join(format!("{}.{}", key.stem(), STAGING_EXTENSION))
    }

    /// Move a fully staged file into the cache under `key`.
    ///
    /// Any existing file for the key is removed first (last writer wins).
    /// The previous file is only touched once `staged` is complete, so the
    /// key never refers to a truncated document.
    pub async fn write(&self, key: &CacheKey, staged: &Path) -> Result<CachedFile, CacheError> {
        if !staged.is_file() {
            return Err(CacheError::StagingMissing {
                path: staged.to_path_buf(),
            });
        }

        let destination = self.location_of(key);

        if destination.exists() {
            debug!(key = %key, "Replacing cached file");
            fs::remove_file(&destination)
                .await
                .map_err(|e| CacheError::write_failed(destination.clone(), e))?;
        }

        match fs::rename(staged, &destination).await {
            Ok(()) => {}
            Err(e) if is_cross_device(&e) => {
                self.copy_into_place(staged, &destination).await?;
            }
            Err(e) => return Err(CacheError::write_failed(destination, e)),
        }

        let meta = fs::metadata(&destination)
            .await
            .map_err(|e| CacheError::write_failed(destination.clone(), e))?;

        Ok(CachedFile {
            key: key.clone(),
            path: destination,
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Cross-filesystem commit: copy next to the destination, then rename.
    async fn copy_into_place(&self, staged: &Path, destination: &Path) -> Result<(), CacheError> {
        let partial = destination.with_extension(format!("pdf.{}", PARTIAL_EXTENSION));

        let copied = async {
            fs::copy(staged, &partial).await?;
            fs::rename(&partial, destination).await
        }
        .await;

        if let Err(e) = copied {
            let _ = fs::remove_file(&partial).await;
            return Err(CacheError::write_failed(destination.to_path_buf(), e));
        }

        if let Err(e) = fs::remove_file(staged).await {
            warn!("Failed to remove staged file {}: {}", staged.display(), e);
        }
        Ok(())
    }

    /// Metadata of the cached file for `key`, if present.
    pub async fn entry(&self, key: &CacheKey) -> Option<CachedFile> {
        let path = self.location_of(key);
        let meta = fs::metadata(&path).await.ok().filter(|m| m.is_file())?;
        Some(CachedFile {
            key: key.clone(),
            path,
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Remove the cached file for `key`. Returns whether a file was removed.
    pub async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        match fs::remove_file(self.location_of(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// List committed documents, sorted by key.
    pub async fn list(&self) -> Result<Vec<CachedFile>, CacheError> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::unavailable(self.directory.clone(), e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(CacheKey::from_file_name) else {
                continue;
            };
            if let Some(file) = self.entry(&key).await {
                files.push(file);
            }
        }
        files.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(files)
    }

    /// Delete abandoned staging files. Returns how many were removed.
    pub async fn purge_staging(&self) -> Result<usize, CacheError> {
        let mut entries = match fs::read_dir(&self.staging_directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::unavailable(self.staging_directory.clone(), e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_staging = path
                .extension()
                .is_some_and(|ext| ext == STAGING_EXTENSION);
            if !is_staging {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove staging file {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

/// Build a `file://` URI for a local path.
pub(crate) fn file_uri(path: &Path) -> String {
    reqwest::Url::from_file_path(path)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

fn is_cross_device(e: &std::io::Error) -> bool {
    // EXDEV on Linux and macOS
    #[cfg(unix)]
    let exdev = e.raw_os_error() == Some(18);
    #[cfg(not(unix))]
    let exdev = false;

    e.kind() == std::io::ErrorKind::CrossesDevices || exdev
}

//! Configuration for the local cache.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How cache keys are derived from catalog records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// `<sanitized title>.pdf`. Two titles that sanitize alike share a file.
    #[default]
    Title,
    /// `<sanitized title>_<sanitized id>.pdf`. Unique per catalog record.
    TitleAndId,
}

/// Configuration for the local PDF cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root cache directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Subdirectory of `root` holding the cached documents.
    #[serde(default = "default_subdirectory")]
    pub subdirectory: String,

    /// Where in-progress downloads are written. Defaults to a hidden
    /// directory inside the cache directory so commits are plain renames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    #[serde(default)]
    pub key_strategy: KeyStrategy,

    /// Remove abandoned staging files at startup.
    #[serde(default = "default_true")]
    pub purge_staging_on_start: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from("cache")
}

fn default_subdirectory() -> String {
    "pdfs".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            subdirectory: default_subdirectory(),
            staging_dir: None,
            key_strategy: KeyStrategy::default(),
            purge_staging_on_start: true,
        }
    }
}

impl CacheConfig {
    /// Creates a config rooted at the given directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Sets the key strategy.
    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }

    /// Sets the staging directory.
    pub fn with_staging_dir(mut self, path: PathBuf) -> Self {
        self.staging_dir = Some(path);
        self
    }

    /// The directory cached documents live in.
    pub fn directory(&self) -> PathBuf {
        self.root.join(&self.subdirectory)
    }

    /// The directory downloads are staged in.
    pub fn staging_directory(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| self.directory().join(".staging"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.directory(), PathBuf::from("cache/pdfs"));
        assert_eq!(
            config.staging_directory(),
            PathBuf::from("cache/pdfs/.staging")
        );
        assert_eq!(config.key_strategy, KeyStrategy::Title);
        assert!(config.purge_staging_on_start);
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::at("/tmp/libris")
            .with_key_strategy(KeyStrategy::TitleAndId)
            .with_staging_dir(PathBuf::from("/tmp/staging"));

        assert_eq!(config.directory(), PathBuf::from("/tmp/libris/pdfs"));
        assert_eq!(config.staging_directory(), PathBuf::from("/tmp/staging"));
        assert_eq!(config.key_strategy, KeyStrategy::TitleAndId);
    }
}

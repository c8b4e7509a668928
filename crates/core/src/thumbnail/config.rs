//! Configuration for the thumbnail generator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::ThumbnailSpec;

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Whether storage events are handled by this process.
    #[serde(default)]
    pub enabled: bool,

    /// Path to the pdftoppm binary.
    #[serde(default = "default_rasterizer_path")]
    pub rasterizer_path: PathBuf,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// JPEG quality (1-100).
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Scratch directory for downloaded PDFs and rendered pages.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Timeout for rendering one page in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_rasterizer_path() -> PathBuf {
    PathBuf::from("pdftoppm")
}

fn default_width() -> u32 {
    400
}

fn default_height() -> u32 {
    600
}

fn default_quality() -> u8 {
    85
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("libris-thumbnails")
}

fn default_timeout() -> u64 {
    120
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rasterizer_path: default_rasterizer_path(),
            width: default_width(),
            height: default_height(),
            quality: default_quality(),
            temp_dir: default_temp_dir(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ThumbnailConfig {
    /// Output geometry and encoding.
    pub fn spec(&self) -> ThumbnailSpec {
        ThumbnailSpec {
            width: self.width,
            height: self.height,
            quality: self.quality,
        }
    }
}

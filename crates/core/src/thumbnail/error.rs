//! Error types for the thumbnail module.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors from rendering a PDF page.
#[derive(Debug, Error)]
pub enum RasterizeError {
    /// Rasterizer binary not found.
    #[error("Rasterizer not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The rasterizer exited with an error.
    #[error("Rasterizer failed with exit code {code:?}")]
    Failed {
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// Rendering timed out.
    #[error("Rasterizer timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The rasterizer succeeded but produced no image.
    #[error("No image produced at {path}")]
    OutputMissing { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from generating and attaching a thumbnail.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Backend error: {0}")]
    Backend(#[from] CatalogError),

    #[error("Failed to render thumbnail: {0}")]
    Rasterize(#[from] RasterizeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Mock rasterizer for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::thumbnail::{RasterizeError, Rasterizer, ThumbnailSpec};

/// Smallest JPEG-looking payload: SOI and EOI markers.
const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

/// Mock implementation of the Rasterizer trait.
#[derive(Debug)]
pub struct MockRasterizer {
    output: Arc<RwLock<Vec<u8>>>,
    specs: Arc<RwLock<Vec<ThumbnailSpec>>>,
    next_error: Arc<RwLock<Option<RasterizeError>>>,
}

impl Default for MockRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRasterizer {
    pub fn new() -> Self {
        Self {
            output: Arc::new(RwLock::new(FAKE_JPEG.to_vec())),
            specs: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the bytes returned for every render.
    pub async fn set_output(&self, output: Vec<u8>) {
        *self.output.write().await = output;
    }

    /// Configure the next render to fail with the given error.
    pub async fn set_next_error(&self, error: RasterizeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Specs of every successful render.
    pub async fn recorded_specs(&self) -> Vec<ThumbnailSpec> {
        self.specs.read().await.clone()
    }

    pub async fn render_count(&self) -> usize {
        self.specs.read().await.len()
    }
}

#[async_trait]
impl Rasterizer for MockRasterizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render_first_page(
        &self,
        pdf: &Path,
        spec: &ThumbnailSpec,
    ) -> Result<Vec<u8>, RasterizeError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if !pdf.is_file() {
            return Err(RasterizeError::InputNotFound {
                path: pdf.to_path_buf(),
            });
        }
        self.specs.write().await.push(*spec);
        Ok(self.output.read().await.clone())
    }

    async fn validate(&self) -> Result<(), RasterizeError> {
        Ok(())
    }
}

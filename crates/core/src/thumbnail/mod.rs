//! Cover thumbnail generation.
//!
//! Runs alongside the backend rather than in the reader path: when a PDF
//! lands in storage, [`ThumbnailGenerator::handle_event`] renders its first
//! page, uploads the image and points the matching book's `coverImageId`
//! at it. The reader side only notices through `cover_image_url`.

mod config;
mod error;
mod generator;
mod rasterizer;
mod types;

pub use config::ThumbnailConfig;
pub use error::{RasterizeError, ThumbnailError};
pub use generator::{ThumbnailGenerator, PLACEHOLDER_COVER_MARKER};
pub use rasterizer::{PdftoppmRasterizer, Rasterizer};
pub use types::{ReconcileReport, StorageEvent, ThumbnailOutcome, ThumbnailResponse, ThumbnailSpec};

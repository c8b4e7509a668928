//! Thumbnail event and result types.

use serde::{Deserialize, Serialize};

const PDF_SUFFIX: &str = ".pdf";
const THUMBNAIL_SUFFIX: &str = "_thumb.jpg";
const LEGACY_THUMBNAIL_SUFFIXES: [&str; 2] = ["_thumb.png", "_thumb.jpg"];

/// A "file created" notification from object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "$id", default)]
    pub file_id: String,
    #[serde(rename = "bucketId", default)]
    pub bucket_id: String,
    #[serde(default)]
    pub name: String,
}

impl StorageEvent {
    /// Parse a raw event body. An empty body counts as `{}`.
    ///
    /// Returns `None` when the body is not JSON or lacks a file or bucket id.
    pub fn parse(body: &str) -> Option<Self> {
        let body = if body.trim().is_empty() { "{}" } else { body };
        let event: Self = serde_json::from_str(body).ok()?;
        if event.file_id.is_empty() || event.bucket_id.is_empty() {
            return None;
        }
        Some(event)
    }

    /// Whether the file name ends in `.pdf`, ignoring case.
    pub fn is_pdf(&self) -> bool {
        strip_pdf_suffix(&self.name).is_some()
    }

    /// Name of the thumbnail uploaded for this file.
    pub fn thumbnail_name(&self) -> String {
        let stem = strip_pdf_suffix(&self.name).unwrap_or(&self.name);
        format!("{}{}", stem, THUMBNAIL_SUFFIX)
    }
}

fn strip_pdf_suffix(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(PDF_SUFFIX.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, ext) = name.split_at(split);
    ext.eq_ignore_ascii_case(PDF_SUFFIX).then_some(stem)
}

/// Map a thumbnail file name back to the PDF it was made from.
pub(crate) fn pdf_name_for_thumbnail(name: &str) -> Option<String> {
    LEGACY_THUMBNAIL_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .map(|stem| format!("{}{}", stem, PDF_SUFFIX))
}

/// Output geometry and JPEG quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

/// Result of handling one storage event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ThumbnailOutcome {
    /// Thumbnail uploaded; `book_id` is set when a book was updated.
    Generated {
        thumbnail_id: String,
        book_id: Option<String>,
    },
    /// The file is not something we make thumbnails for.
    Skipped { reason: String },
    /// The event payload was malformed.
    Rejected { reason: String },
    /// Download, render, upload or update failed.
    Failed { error: String },
}

impl ThumbnailOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generated { .. } => "generated",
            Self::Skipped { .. } => "skipped",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }
}

/// Body returned to the storage event trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ThumbnailOutcome> for ThumbnailResponse {
    fn from(outcome: &ThumbnailOutcome) -> Self {
        let mut response = Self {
            success: outcome.is_success(),
            message: None,
            thumbnail_id: None,
            book_id: None,
            error: None,
        };
        match outcome {
            ThumbnailOutcome::Generated {
                thumbnail_id,
                book_id,
            } => {
                response.thumbnail_id = Some(thumbnail_id.clone());
                response.book_id = book_id.clone();
                response.message = Some("Thumbnail generated successfully".to_string());
            }
            ThumbnailOutcome::Skipped { reason } | ThumbnailOutcome::Rejected { reason } => {
                response.message = Some(reason.clone());
            }
            ThumbnailOutcome::Failed { error } => response.error = Some(error.clone()),
        }
        response
    }
}

/// Result of matching existing thumbnails to books.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub updated: usize,
    pub missing: usize,
}

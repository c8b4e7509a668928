//! Platform document opener.
//!
//! Hands a cached document to the operating system's PDF viewer. The
//! opener never touches the cache; it only receives a `file://` URI.

mod config;
mod system;

pub use config::OpenerConfig;
pub use system::SystemOpener;

use async_trait::async_trait;
use thiserror::Error;

/// MIME type of every document handed to the opener.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Errors that can occur while launching a viewer.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The URI is malformed or not a local file URI.
    #[error("Unsupported URI: {0}")]
    UnsupportedUri(String),

    /// The URI is well formed but nothing can be opened there.
    #[error("Cannot open {0}")]
    NotOpenable(String),

    /// The viewer program is not installed.
    #[error("No viewer available: '{program}' not found")]
    NoViewer { program: String },

    /// The viewer program exited with an error.
    #[error("Viewer '{program}' failed with exit code {code:?}")]
    ViewerFailed { program: String, code: Option<i32> },

    /// I/O error while launching the viewer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpenError {
    /// Message shown to the user.
    pub fn user_message(&self) -> &'static str {
        "Unable to open PDF viewer on this device"
    }

    /// Whether opening again may succeed without configuration changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ViewerFailed { .. } | Self::Io(_))
    }
}

/// Launches a viewer for local documents.
#[async_trait]
pub trait Opener: Send + Sync {
    /// Returns the name of this opener implementation.
    fn name(&self) -> &str;

    /// Whether `uri` can be handed to a viewer.
    async fn can_open(&self, uri: &str) -> bool;

    /// Launch a viewer for `uri`.
    async fn open(&self, uri: &str) -> Result<(), OpenError>;
}

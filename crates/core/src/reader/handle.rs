use serde::Serialize;
use std::path::PathBuf;

use crate::cache::{CacheKey, CacheStore};

/// A committed local copy of a book's document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocalPdfHandle {
    pub book_id: String,
    pub key: CacheKey,
    pub path: PathBuf,
    /// `file://` URI handed to the opener.
    pub uri: String,
    /// True when no download was needed.
    pub from_cache: bool,
}

impl LocalPdfHandle {
    pub(crate) fn new(store: &CacheStore, book_id: &str, key: CacheKey, from_cache: bool) -> Self {
        Self {
            book_id: book_id.to_string(),
            path: store.location_of(&key),
            uri: store.uri_of(&key),
            key,
            from_cache,
        }
    }
}

//! Cache key derivation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::BookRecord;

use super::KeyStrategy;

/// Extension appended to every cache key.
pub const CACHE_EXTENSION: &str = ".pdf";

const SEPARATOR: char = '_';

/// Filename of a cached document, derived from catalog data.
///
/// Keys only contain ASCII alphanumerics, `_` and the `.pdf` suffix, so
/// they are always a single path component. Distinct titles can map to
/// the same key under [`KeyStrategy::Title`]; use
/// [`KeyStrategy::TitleAndId`] when titles are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from a title. Pure: equal titles give equal keys.
    pub fn derive(title: &str) -> Self {
        Self(format!("{}{}", sanitize(title), CACHE_EXTENSION))
    }

    /// Derive the key for a catalog record.
    ///
    /// A blank title falls back to the record id.
    pub fn for_book(book: &BookRecord, strategy: KeyStrategy) -> Self {
        if book.title.trim().is_empty() {
            return Self::derive(&book.id);
        }
        match strategy {
            KeyStrategy::Title => Self::derive(&book.title),
            KeyStrategy::TitleAndId => Self(format!(
                "{}{}{}{}",
                sanitize(&book.title),
                SEPARATOR,
                sanitize(&book.id),
                CACHE_EXTENSION
            )),
        }
    }

    /// Parse a filename found in the cache directory.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(CACHE_EXTENSION)?;
        let valid = stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == SEPARATOR);
        valid.then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key without its extension.
    pub fn stem(&self) -> &str {
        self.0.strip_suffix(CACHE_EXTENSION).unwrap_or(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Replace everything except ASCII alphanumerics with the separator.
///
/// One separator is emitted per UTF-16 code unit so keys stay identical
/// to those already written by the mobile client.
fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            for _ in 0..c.len_utf16() {
                out.push(SEPARATOR);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, title: &str) -> BookRecord {
        BookRecord {
            id: id.to_string(),
            title: title.to_string(),
            author: "Author".to_string(),
            description: String::new(),
            remote_url: Some("https://host/f1.pdf".to_string()),
            cover_image_url: None,
            cover_image_id: None,
            page_count: 0,
            language: None,
            genre: None,
        }
    }

    #[test]
    fn test_derive_replaces_punctuation() {
        assert_eq!(
            CacheKey::derive("Ash-Shifa Shareef!").as_str(),
            "Ash_Shifa_Shareef_.pdf"
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = CacheKey::derive("Seerat-e-Mustafa");
        let b = CacheKey::derive("Seerat-e-Mustafa");
        assert_eq!(a, b);
        assert_eq!(a.stem(), "Seerat_e_Mustafa");
    }

    #[test]
    fn test_derive_non_ascii() {
        // 'é' is one UTF-16 unit, the emoji is two
        assert_eq!(CacheKey::derive("Café").as_str(), "Caf_.pdf");
        assert_eq!(CacheKey::derive("a📖b").as_str(), "a__b.pdf");
    }

    #[test]
    fn test_derive_keeps_case_and_digits() {
        assert_eq!(
            CacheKey::derive("432 Adawlatul Makkiya").as_str(),
            "432_Adawlatul_Makkiya.pdf"
        );
    }

    #[test]
    fn test_keys_never_contain_path_separators() {
        let key = CacheKey::derive("../../etc/passwd");
        assert!(!key.as_str().contains('/'));
        assert!(key.as_str().ends_with(".pdf"));
    }

    #[test]
    fn test_title_collision() {
        let a = CacheKey::for_book(&book("b1", "Shifa Shareef (Urdu)"), KeyStrategy::Title);
        let b = CacheKey::for_book(&book("b2", "Shifa Shareef [Urdu]"), KeyStrategy::Title);
        assert_eq!(a, b);

        let a = CacheKey::for_book(&book("b1", "Shifa Shareef (Urdu)"), KeyStrategy::TitleAndId);
        let b = CacheKey::for_book(&book("b2", "Shifa Shareef [Urdu]"), KeyStrategy::TitleAndId);
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "Shifa_Shareef__Urdu__b1.pdf");
    }

    #[test]
    fn test_blank_title_falls_back_to_id() {
        let key = CacheKey::for_book(&book("65f0a1", "  "), KeyStrategy::Title);
        assert_eq!(key.as_str(), "65f0a1.pdf");
    }

    #[test]
    fn test_from_file_name() {
        assert_eq!(
            CacheKey::from_file_name("Seerat_e_Mustafa.pdf"),
            Some(CacheKey::derive("Seerat-e-Mustafa"))
        );
        assert!(CacheKey::from_file_name("notes.txt").is_none());
        assert!(CacheKey::from_file_name("x.pdf.partial").is_none());
        assert!(CacheKey::from_file_name("a b.pdf").is_none());
    }
}

//! Local PDF cache.
//!
//! A single directory on durable storage holds one file per cache key,
//! named `<sanitized-title>.pdf`. There is no manifest: presence of the
//! file is the only state. Downloads are staged in a separate directory
//! and only moved into the cache once complete, so a truncated file is
//! never visible under a cache key.

mod config;
mod error;
mod key;
mod store;

pub use config::{CacheConfig, KeyStrategy};
pub use error::CacheError;
pub use key::CacheKey;
pub use store::{CacheStore, CachedFile};

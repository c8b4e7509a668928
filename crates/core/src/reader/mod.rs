//! Fetch-or-serve controller.
//!
//! [`FetchOrServe`] is the single entry point the screens use to get a
//! local copy of a catalog document: serve it from the cache when present,
//! otherwise download it into a staging file and commit it under its key.
//! The filesystem is the only state; the controller keeps nothing between
//! calls apart from the per-key in-flight locks.

mod controller;
mod error;
mod handle;
mod inflight;

pub use controller::FetchOrServe;
pub use error::{FetchError, ReaderError};
pub use handle::LocalPdfHandle;

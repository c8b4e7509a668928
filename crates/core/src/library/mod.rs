//! Screen-level library operations.
//!
//! [`LibraryService`] ties the catalog, the fetch-or-serve controller and
//! the opener together for the list, detail and reader screens.

mod service;
mod types;

pub use service::LibraryService;
pub use types::{
    BookDetails, BookSummary, LibraryError, OpenOptions, OpenOutcome, ReaderPolicy, ReaderStatus,
    ReaderView,
};

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod downloader;
pub mod library;
pub mod metrics;
pub mod opener;
pub mod reader;
pub mod testing;
pub mod thumbnail;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use cache::{CacheConfig, CacheError, CacheKey, CacheStore, CachedFile, KeyStrategy};
pub use catalog::{
    AppwriteClient, BackendStore, BookDocument, BookRecord, Catalog, CatalogError, FileUrls,
    StoredFile,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, BackendConfig,
    CatalogConfig, Config, ConfigError, ReaderConfig, SanitizedConfig, ServerConfig,
};
pub use downloader::{DownloadError, Downloader, HttpDownloader};
pub use library::{
    BookDetails, BookSummary, LibraryError, LibraryService, OpenOptions, OpenOutcome,
    ReaderPolicy, ReaderStatus, ReaderView,
};
pub use opener::{OpenError, Opener, OpenerConfig, SystemOpener, PDF_MIME_TYPE};
pub use reader::{FetchError, FetchOrServe, LocalPdfHandle, ReaderError};
pub use thumbnail::{
    PdftoppmRasterizer, RasterizeError, Rasterizer, ReconcileReport, StorageEvent,
    ThumbnailConfig, ThumbnailError, ThumbnailGenerator, ThumbnailOutcome, ThumbnailResponse,
    ThumbnailSpec, PLACEHOLDER_COVER_MARKER,
};

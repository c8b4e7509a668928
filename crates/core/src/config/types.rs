use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::cache::{CacheConfig, KeyStrategy};
use crate::opener::OpenerConfig;
use crate::thumbnail::ThumbnailConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub opener: OpenerConfig,
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication for the maintenance and storage-event routes.
///
/// Catalog and reader routes are always open.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,
    /// Shared key expected when `method = "api_key"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    None,
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey => "api_key",
        }
    }
}

/// Hosted backend (document database + object storage) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// REST endpoint (e.g., "https://cloud.appwrite.io/v1").
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub books_collection_id: String,
    pub storage_bucket_id: String,
    /// Server API key. Only needed for the thumbnail generator and admin routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Catalog query limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_search_limit() -> u32 {
    50
}

/// Reader screen behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReaderConfig {
    /// Fetch and open the document as soon as the reader is mounted.
    #[serde(default = "default_true")]
    pub auto_open_on_mount: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            auto_open_on_mount: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub backend: SanitizedBackendConfig,
    pub catalog: CatalogConfig,
    pub cache: SanitizedCacheConfig,
    pub reader: ReaderConfig,
    pub thumbnails_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
}

/// Sanitized backend config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBackendConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub books_collection_id: String,
    pub storage_bucket_id: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCacheConfig {
    pub directory: String,
    pub key_strategy: KeyStrategy,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let backend = &config.backend;
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
            },
            server: config.server.clone(),
            backend: SanitizedBackendConfig {
                endpoint: backend.endpoint.clone(),
                project_id: backend.project_id.clone(),
                database_id: backend.database_id.clone(),
                books_collection_id: backend.books_collection_id.clone(),
                storage_bucket_id: backend.storage_bucket_id.clone(),
                api_key_configured: backend.api_key.as_ref().is_some_and(|k| !k.is_empty()),
                timeout_secs: backend.timeout_secs,
            },
            catalog: config.catalog.clone(),
            cache: SanitizedCacheConfig {
                directory: config.cache.directory().display().to_string(),
                key_strategy: config.cache.key_strategy,
            },
            reader: config.reader.clone(),
            thumbnails_enabled: config.thumbnails.enabled,
        }
    }
}

//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, so the HTTP surface can be exercised
//! without a backend, network access or a PDF viewer.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use libris_core::{
    create_authenticator, load_config_from_str,
    testing::{MockBackendStore, MockCatalog, MockDownloader, MockOpener, MockRasterizer},
    AuthMethod, Authenticator, BackendStore, CacheConfig, CacheStore, Catalog, Downloader,
    FetchOrServe, LibraryService, Opener, Rasterizer, ReaderPolicy, ThumbnailGenerator,
};

/// Re-export fixtures for test convenience
pub use libris_core::testing::fixtures;

/// Bucket holding uploaded PDFs in tests.
pub const BUCKET: &str = "books-bucket";

const BASE_CONFIG: &str = r#"
[backend]
endpoint = "https://cloud.example.com/v1"
project_id = "proj"
database_id = "db"
books_collection_id = "books"
storage_bucket_id = "books-bucket"
"#;

/// Test fixture with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - Catalog reads (MockCatalog)
/// - Document downloads (MockDownloader)
/// - The platform viewer (MockOpener)
/// - Backend storage used by the thumbnail generator (MockBackendStore)
/// - Page rendering (MockRasterizer)
///
/// The cache lives in a temporary directory owned by the fixture.
pub struct TestFixture {
    pub router: Router,
    pub catalog: Arc<MockCatalog>,
    pub downloader: Arc<MockDownloader>,
    pub opener: Arc<MockOpener>,
    pub backend: Arc<MockBackendStore>,
    pub rasterizer: Arc<MockRasterizer>,
    pub store: Arc<CacheStore>,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = load_config_from_str(BASE_CONFIG).expect("Invalid test config");
        config.cache = CacheConfig::at(temp_dir.path());
        config.reader.auto_open_on_mount = test_config.auto_open_on_mount;
        config.thumbnails.enabled = test_config.enable_thumbnails;
        config.thumbnails.temp_dir = temp_dir.path().join("thumbnails");
        if let Some(key) = &test_config.api_key {
            config.auth.method = AuthMethod::ApiKey;
            config.auth.api_key = Some(key.clone());
        }
        let authenticator: Arc<dyn Authenticator> =
            Arc::from(create_authenticator(&config.auth).expect("Invalid auth config"));

        // Create mocks
        let catalog = Arc::new(MockCatalog::new());
        let downloader = Arc::new(MockDownloader::new());
        let opener = Arc::new(MockOpener::new());
        let backend = Arc::new(MockBackendStore::new());
        let rasterizer = Arc::new(MockRasterizer::new());

        let store = Arc::new(CacheStore::new(&config.cache));
        let reader = Arc::new(FetchOrServe::new(
            Arc::clone(&store),
            Arc::clone(&downloader) as Arc<dyn Downloader>,
        ));
        let library = Arc::new(LibraryService::new(
            Arc::clone(&catalog) as Arc<dyn Catalog>,
            reader,
            Arc::clone(&opener) as Arc<dyn Opener>,
            ReaderPolicy::from(&config.reader),
        ));
        let thumbnails = Arc::new(ThumbnailGenerator::new(
            Arc::clone(&backend) as Arc<dyn BackendStore>,
            Arc::clone(&rasterizer) as Arc<dyn Rasterizer>,
            &config.thumbnails,
            BUCKET,
        ));

        // Create app state with mocks
        let state = Arc::new(libris_server::state::AppState::new(
            config,
            authenticator,
            library,
            thumbnails,
        ));

        let router = libris_server::api::create_router(state);

        Self {
            router,
            catalog,
            downloader,
            opener,
            backend,
            rasterizer,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request without a body, with one extra header.
    pub async fn post_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(name, value)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with raw string body and one extra header.
    pub async fn post_raw_with_header(
        &self,
        path: &str,
        body: &str,
        name: &str,
        value: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .header(name, value)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with raw string body (for testing malformed payloads).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Open the document when the reader is mounted
    pub auto_open_on_mount: bool,
    /// Accept storage events
    pub enable_thumbnails: bool,
    /// Require this key on protected routes (`auth.method = "api_key"`)
    pub api_key: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            auto_open_on_mount: true,
            enable_thumbnails: false,
            api_key: None,
        }
    }
}

impl TestConfig {
    /// Create config with storage events enabled.
    pub fn with_thumbnails() -> Self {
        Self {
            enable_thumbnails: true,
            ..Default::default()
        }
    }

    /// Create config where protected routes require `key`.
    pub fn with_api_key(key: &str) -> Self {
        Self {
            api_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    /// Create config where mounting the reader does not open the document.
    pub fn manual_open() -> Self {
        Self {
            auto_open_on_mount: false,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}

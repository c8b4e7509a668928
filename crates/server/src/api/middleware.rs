//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use libris_core::{AuthError, AuthRequest, Identity};
use tracing::{error, warn};

use super::handlers::{ApiError, ErrorResponse};
use crate::metrics::{
    AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

const UNMATCHED_PATH: &str = "unmatched";

/// Tracks HTTP request duration, count and requests in flight.
///
/// Paths are labelled by their route template (`/books/{id}`) so that
/// ids do not blow up label cardinality.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Rejects requests the configured authenticator does not accept.
///
/// Accepted requests carry their [`Identity`] as a request extension.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let authenticator = state.authenticator();

    if authenticator.method_name() == "none" {
        request.extensions_mut().insert(Identity::anonymous());
        return Ok(next.run(request).await);
    }

    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();
    let source_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };
    match authenticator.authenticate(&auth_request).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(e) => {
            let (status, reason) = match &e {
                AuthError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
                AuthError::InvalidCredentials(_) => {
                    (StatusCode::UNAUTHORIZED, "invalid_credentials")
                }
                AuthError::ConfigurationError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            };
            AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
            if status == StatusCode::UNAUTHORIZED {
                warn!(path = %request.uri().path(), %source_ip, "Rejected request: {}", e);
            } else {
                error!("Authenticator failed: {}", e);
            }
            Err((status, Json(ErrorResponse::new("Unauthorized", &e))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, middleware, routing::get, Router};
    use libris_core::{
        load_config_from_str,
        testing::{MockBackendStore, MockCatalog, MockDownloader, MockOpener, MockRasterizer},
        ApiKeyAuthenticator, Authenticator, CacheConfig, CacheStore, FetchOrServe,
        LibraryService, NoneAuthenticator, ReaderPolicy, ThumbnailGenerator,
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    fn test_state(authenticator: Arc<dyn Authenticator>, temp: &TempDir) -> Arc<AppState> {
        let mut config = load_config_from_str(
            r#"
[backend]
endpoint = "https://cloud.example.com/v1"
project_id = "proj"
database_id = "db"
books_collection_id = "books"
storage_bucket_id = "bucket"
"#,
        )
        .unwrap();
        config.cache = CacheConfig::at(temp.path());

        let store = Arc::new(CacheStore::new(&config.cache));
        let reader = Arc::new(FetchOrServe::new(store, Arc::new(MockDownloader::new())));
        let library = Arc::new(LibraryService::new(
            Arc::new(MockCatalog::new()),
            reader,
            Arc::new(MockOpener::new()),
            ReaderPolicy::from(&config.reader),
        ));
        let thumbnails = Arc::new(ThumbnailGenerator::new(
            Arc::new(MockBackendStore::new()),
            Arc::new(MockRasterizer::new()),
            &config.thumbnails,
            "bucket",
        ));
        Arc::new(AppState::new(config, authenticator, library, thumbnails))
    }

    fn guarded_app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/admin/job", get(dummy_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn status_with(app: Router, credential: Option<(header::HeaderName, &str)>) -> StatusCode {
        let mut builder = Request::builder().uri("/admin/job");
        if let Some((name, value)) = credential {
            builder = builder.header(name, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_none_auth_allows_all() {
        let temp = TempDir::new().unwrap();
        let app = guarded_app(test_state(Arc::new(NoneAuthenticator), &temp));

        assert_eq!(status_with(app, None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_key_auth() {
        let temp = TempDir::new().unwrap();
        let state = test_state(Arc::new(ApiKeyAuthenticator::new("librarian")), &temp);
        let app = guarded_app(state);
        let x_api_key = header::HeaderName::from_static("x-api-key");

        assert_eq!(
            status_with(app.clone(), Some((header::AUTHORIZATION, "Bearer librarian"))).await,
            StatusCode::OK
        );
        assert_eq!(
            status_with(app.clone(), Some((x_api_key, "librarian"))).await,
            StatusCode::OK
        );
        assert_eq!(
            status_with(app.clone(), Some((header::AUTHORIZATION, "Bearer visitor"))).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_with(app, None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_failures_are_counted() {
        let temp = TempDir::new().unwrap();
        let app = guarded_app(test_state(
            Arc::new(ApiKeyAuthenticator::new("librarian")),
            &temp,
        ));
        let counter = AUTH_FAILURES_TOTAL.with_label_values(&["not_authenticated"]);
        let before = counter.get();

        assert_eq!(status_with(app, None).await, StatusCode::UNAUTHORIZED);
        assert!(counter.get() > before);
    }

    #[tokio::test]
    async fn test_records_route_template() {
        let app = Router::new()
            .route("/items/{id}", get(dummy_handler))
            .route_layer(middleware::from_fn(metrics_middleware));

        let request = Request::builder()
            .uri("/items/abc123")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let count = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/items/{id}", "200"])
            .get();
        assert!(count >= 1);
    }
}

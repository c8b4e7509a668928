use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris_core::{
    create_authenticator, load_config, validate_config, AppwriteClient, Authenticator,
    BackendStore, CacheStore, Catalog, Downloader, FetchOrServe, HttpDownloader, LibraryService,
    Opener, PdftoppmRasterizer, Rasterizer, ReaderPolicy, SystemOpener, ThumbnailGenerator,
};
use libris_server::api::create_router;
use libris_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("LIBRIS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Backend endpoint: {}", config.backend.endpoint);

    // Local cache
    let store = Arc::new(CacheStore::new(&config.cache));
    store
        .ensure_directory()
        .await
        .context("Failed to prepare cache directory")?;
    info!("Cache directory: {}", store.directory().display());

    if config.cache.purge_staging_on_start {
        match store.purge_staging().await {
            Ok(0) => {}
            Ok(n) => info!("Removed {} abandoned partial download(s)", n),
            Err(e) => warn!("Failed to purge staging directory: {}", e),
        }
    }

    // Backend client
    let backend = Arc::new(
        AppwriteClient::new(&config.backend, &config.catalog)
            .context("Failed to create backend client")?,
    );
    let catalog: Arc<dyn Catalog> = backend.clone();
    let backend_store: Arc<dyn BackendStore> = backend;

    // Fetch-or-serve controller
    let downloader: Arc<dyn Downloader> = Arc::new(
        HttpDownloader::new(Duration::from_secs(config.backend.timeout_secs as u64))
            .context("Failed to create downloader")?,
    );
    info!("Document downloader: {}", downloader.name());
    let reader = Arc::new(FetchOrServe::new(Arc::clone(&store), downloader));

    // Platform opener
    let opener = SystemOpener::new(&config.opener);
    info!("PDF viewer launcher: {} ({})", opener.name(), opener.program());
    let opener: Arc<dyn Opener> = Arc::new(opener);

    let library = Arc::new(LibraryService::new(
        catalog,
        reader,
        opener,
        ReaderPolicy::from(&config.reader),
    ));

    // Thumbnail generator
    let rasterizer = PdftoppmRasterizer::new(&config.thumbnails);
    if config.thumbnails.enabled {
        match rasterizer.validate().await {
            Ok(()) => info!("Thumbnail generation enabled ({})", rasterizer.name()),
            Err(e) => warn!("Rasterizer unavailable, thumbnail events will fail: {}", e),
        }
    } else {
        info!("Thumbnail generation disabled in config");
    }
    let thumbnails = Arc::new(ThumbnailGenerator::new(
        backend_store,
        Arc::new(rasterizer),
        &config.thumbnails,
        config.backend.storage_bucket_id.clone(),
    ));

    // Authenticator for storage events and maintenance routes
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Admin route authentication: {}", authenticator.method_name());
    if authenticator.method_name() == "none" {
        warn!("Storage event and admin routes are open to any caller (auth.method = \"none\")");
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        library,
        thumbnails,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

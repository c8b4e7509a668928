use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    admin, books, events, handlers,
    middleware::{auth_middleware, metrics_middleware},
};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Routes that write to the hosted backend with the server's key
    let protected_routes = Router::new()
        // Storage events (thumbnail generator)
        .route("/events/storage", post(events::storage_event))
        // Maintenance
        .route(
            "/admin/thumbnails/reconcile",
            post(admin::reconcile_thumbnails),
        )
        .route(
            "/admin/covers/clear-placeholders",
            post(admin::clear_placeholder_covers),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Books
        .route("/books", get(books::list_books))
        .route("/books/search", get(books::search_books))
        .route("/books/{id}", get(books::get_book))
        .route("/books/{id}/open", post(books::open_book))
        .route("/books/{id}/reader", get(books::mount_reader))
        .route("/books/{id}/cache", delete(books::remove_cached_copy))
        .route("/languages", get(books::list_languages))
        // Local cache
        .route("/cache", get(books::list_cache))
        .merge(protected_routes)
        .route_layer(middleware::from_fn(metrics_middleware));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

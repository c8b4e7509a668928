//! Maintenance endpoints for cover thumbnails.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use libris_core::{CatalogError, ReconcileReport, ThumbnailError, PLACEHOLDER_COVER_MARKER};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::handlers::{ApiError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ClearPlaceholdersParams {
    #[serde(default)]
    pub marker: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearPlaceholdersResponse {
    pub cleared: usize,
    pub marker: String,
}

fn thumbnail_error(err: ThumbnailError) -> ApiError {
    error!("Maintenance job failed: {}", err);
    let status = match &err {
        ThumbnailError::Backend(CatalogError::NotConfigured(_)) => StatusCode::SERVICE_UNAVAILABLE,
        ThumbnailError::Backend(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new("Maintenance job failed", &err)))
}

/// POST /api/v1/admin/thumbnails/reconcile
///
/// Point every book at the thumbnail already stored for its PDF.
pub async fn reconcile_thumbnails(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReconcileReport>, ApiError> {
    state
        .thumbnails()
        .reconcile()
        .await
        .map(Json)
        .map_err(thumbnail_error)
}

/// POST /api/v1/admin/covers/clear-placeholders
///
/// Blank legacy cover URLs that point at stock placeholder images.
pub async fn clear_placeholder_covers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClearPlaceholdersParams>,
) -> Result<Json<ClearPlaceholdersResponse>, ApiError> {
    let marker = params
        .marker
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER_COVER_MARKER.to_string());

    let cleared = state
        .thumbnails()
        .clear_placeholder_covers(&marker)
        .await
        .map_err(thumbnail_error)?;
    Ok(Json(ClearPlaceholdersResponse { cleared, marker }))
}

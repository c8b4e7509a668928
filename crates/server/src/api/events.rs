//! Object storage event handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use libris_core::ThumbnailResponse;
use tracing::info;

use super::handlers::{ApiError, ErrorResponse};
use crate::state::AppState;

/// POST /api/v1/events/storage
///
/// Generate a cover thumbnail for a freshly uploaded PDF. The body is the
/// raw storage event. Failures are reported in the response body with
/// `success: false`, never as an error status.
pub async fn storage_event(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ThumbnailResponse>, ApiError> {
    if !state.thumbnail_events_enabled() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                "Thumbnail generation is disabled",
                "thumbnails.enabled = false",
            )),
        ));
    }

    let outcome = state.thumbnails().handle_event(&body).await;
    info!(outcome = outcome.label(), "Handled storage event");
    Ok(Json(ThumbnailResponse::from(&outcome)))
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use libris_core::{LocalPdfHandle, SanitizedConfig};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body shared by all API routes.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Message suitable for showing to the user.
    pub error: String,
    pub detail: String,
    /// Cached copy left behind when only the viewer failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<LocalPdfHandle>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, detail: impl ToString) -> Self {
        Self {
            error: error.into(),
            detail: detail.to_string(),
            handle: None,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [("content-type", "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

//! GET /health: liveness check without model calls.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub credential_configured: bool,
    pub document_chars: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        credential_configured: state.config.credential_configured(),
        document_chars: state.document.chars().count(),
    })
}

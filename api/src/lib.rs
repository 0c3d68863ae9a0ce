//! HTTP surface of the campus chat service.
//!
//! Routes:
//! - `POST /api/chat`: answer a question (NDJSON stream or single JSON body)
//! - `GET  /api/chat`: 405 with a JSON error
//! - `GET  /health`  : liveness, no model calls

use std::sync::Arc;

pub mod core;
pub mod error_handler;
pub mod routes;

#[cfg(test)]
mod test_support;

use ai_llm_service::{ChatModel, GeminiService};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

use crate::{
    core::{app_config::AppConfig, app_state::AppState, document::load_document},
    error_handler::AppError,
    routes::{
        chat::chat_route::{chat, method_not_allowed},
        health::health_route::health,
    },
};

/// Builds the router over an already-assembled state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(chat_protocol::CHAT_PATH, post(chat).get(method_not_allowed))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

/// Loads the document, wires the Gemini backend and serves until Ctrl+C.
///
/// # Errors
/// Returns [`AppError::Llm`] for an invalid model config, [`AppError::Bind`]
/// if the address cannot be bound and [`AppError::Server`] if serving fails.
pub async fn start(config: AppConfig) -> Result<(), AppError> {
    if !config.credential_configured() {
        error!("GEMINI_API_KEY is not set; chat requests will fail until it is configured");
    }

    let document = load_document(&config.document_path).await;
    let model: Arc<dyn ChatModel> = Arc::new(GeminiService::new(config.llm.clone())?);
    let address = config.address.clone();
    let app = router(AppState::new(config, document, model));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "chat API listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("chat API stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

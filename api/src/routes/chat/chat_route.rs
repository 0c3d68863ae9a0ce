//! POST /api/chat: answers a question from the context document.

use std::{sync::Arc, time::Instant};

use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use chat_protocol::{ChatAnswer, ChatRequest, NO_IMAGE};
use tracing::{error, info, warn};

use crate::{
    core::{
        app_state::AppState,
        prompt::{NO_ANSWER, SYSTEM_INSTRUCTION, build_answer_prompt, build_image_prompt},
    },
    error_handler::{AppError, AppResult},
    routes::chat::chat_stream,
};

/// Handler: POST /api/chat
///
/// Checks run in this order and stop at the first failure: credential,
/// body shape, question. Then one constrained call picks an image and a
/// second call produces the answer, streamed or whole.
///
/// # Example
/// ```bash
/// curl -N -X POST http://127.0.0.1:3000/api/chat \
///   -H 'content-type: application/json' \
///   -d '{"question":"คณะวิศวกรรมศาสตร์มีกี่สาขา","stream":true}'
/// ```
#[tracing::instrument(skip_all, fields(stream = tracing::field::Empty))]
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> AppResult<Response> {
    if !state.config.credential_configured() {
        error!("chat request rejected: GEMINI_API_KEY is not set");
        return Err(AppError::MissingCredential);
    }

    let request: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "invalid chat request body");
        AppError::InvalidBody
    })?;
    let question = request.trimmed_question().ok_or(AppError::NoQuestion)?;
    let stream = request.stream.unwrap_or(state.config.stream_by_default);
    tracing::Span::current().record("stream", stream);

    info!(question_chars = question.chars().count(), "chat request accepted");

    let image = pick_image(&state, question).await;
    let prompt = build_answer_prompt(&state.document, question);

    if stream {
        return Ok(chat_stream::respond(state.model.clone(), prompt, image));
    }

    let started = Instant::now();
    let answer = state
        .model
        .generate(&prompt, Some(SYSTEM_INSTRUCTION))
        .await
        .map_err(|e| {
            error!(error = %e, "answer generation failed");
            AppError::from(&e)
        })?;

    let answer = if answer.trim().is_empty() {
        NO_ANSWER.to_string()
    } else {
        answer
    };
    info!(
        latency_ms = started.elapsed().as_millis(),
        answer_chars = answer.chars().count(),
        %image,
        "chat answered"
    );
    Ok(Json(ChatAnswer { answer, image }).into_response())
}

/// Handler: GET /api/chat
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Asks the model for one illustration. Never fails the request: any
/// problem degrades to [`NO_IMAGE`].
async fn pick_image(state: &AppState, question: &str) -> String {
    if state.config.images.is_empty() {
        return NO_IMAGE.to_string();
    }
    let options = state.image_options();
    let prompt = build_image_prompt(&state.document, question, &options);
    match state
        .model
        .choose(&prompt, Some(SYSTEM_INSTRUCTION), &options)
        .await
    {
        Ok(image) => image,
        Err(e) => {
            warn!(error = %e, "image pick failed, answering without image");
            NO_IMAGE.to_string()
        }
    }
}

//! NDJSON answer streaming.
//!
//! A spawned task drives the model stream and writes frames into a bounded
//! channel; the response body drains the channel. If the client goes away the
//! send fails and the task stops pulling from the model.

use std::{convert::Infallible, sync::Arc, time::Instant};

use ai_llm_service::ChatModel;
use axum::{
    body::Body,
    http::header,
    response::{IntoResponse, Response},
};
use chat_protocol::{NDJSON_CONTENT_TYPE, StreamFrame};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};

use crate::{
    core::prompt::{NO_ANSWER, SYSTEM_INSTRUCTION},
    error_handler::provider_message,
};

type FrameSender = mpsc::Sender<Result<String, Infallible>>;

/// Starts the producer task and returns the streaming response.
pub fn respond(model: Arc<dyn ChatModel>, prompt: String, image: String) -> Response {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(produce(model, prompt, image, tx));

    (
        [
            (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response()
}

/// Emits `metadata`, then `chunk`s, then `done`; or a single `error` once
/// something fails.
async fn produce(model: Arc<dyn ChatModel>, prompt: String, image: String, tx: FrameSender) {
    let started = Instant::now();

    if send(&tx, StreamFrame::metadata(image)).await.is_err() {
        return;
    }

    let mut stream = match model.stream(&prompt, Some(SYSTEM_INSTRUCTION)).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to start answer stream");
            let _ = send(&tx, StreamFrame::error(provider_message(e.classify()))).await;
            return;
        }
    };

    let mut chunks = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(text) => {
                chunks += 1;
                if send(&tx, StreamFrame::chunk(text)).await.is_err() {
                    info!(chunks, "client disconnected, cancelling answer stream");
                    return;
                }
            }
            Err(e) => {
                error!(error = %e, chunks, "answer stream failed");
                let _ = send(&tx, StreamFrame::error(provider_message(e.classify()))).await;
                return;
            }
        }
    }

    if chunks == 0 && send(&tx, StreamFrame::chunk(NO_ANSWER)).await.is_err() {
        return;
    }
    let _ = send(&tx, StreamFrame::Done).await;

    info!(
        chunks,
        latency_ms = started.elapsed().as_millis(),
        "answer stream completed"
    );
}

async fn send(tx: &FrameSender, frame: StreamFrame) -> Result<(), ()> {
    debug!(?frame, "frame");
    tx.send(Ok(frame.to_line())).await.map_err(|_| ())
}

//! HTTP side of the client: one POST per exchange.
//!
//! Streamed replies are read with `bytes_stream`, reassembled by
//! [`FrameDecoder`] and applied to the session frame by frame. The observer
//! is awaited after every change with the session itself, so a renderer can
//! tick its typing projection at its own pace before the next frame lands.

use std::time::{Duration, Instant};

use chat_protocol::{
    CHAT_PATH, ChatAnswer, ChatRequest, ErrorBody, FrameDecoder, NDJSON_CONTENT_TYPE, StreamFrame,
};
use futures_util::StreamExt;
use reqwest::{Client, Response, header};
use tracing::{debug, info, warn};

use crate::{error::ClientError, session::ChatSession};

pub struct ChatTransport {
    client: Client,
    url: String,
}

impl ChatTransport {
    /// `base` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base = base.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::InvalidEndpoint(base.to_string()));
        }
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            url: format!("{base}{CHAT_PATH}"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends `request` and drives `session` until the pending message settles.
    ///
    /// Never returns an error: any failure ends up as the pending message's
    /// text via [`ChatSession::fail`].
    pub async fn exchange<F>(&self, session: &mut ChatSession, request: &ChatRequest, mut observe: F)
    where
        F: AsyncFnMut(&mut ChatSession),
    {
        let started = Instant::now();
        if let Err(e) = self.try_exchange(session, request, &mut observe).await {
            warn!(error = %e, "chat exchange failed");
            session.fail(e.user_message());
        }
        // A stream that ends without `done` still settles.
        session.finish();
        observe(&mut *session).await;
        info!(latency_ms = started.elapsed().as_millis(), "chat exchange finished");
    }

    async fn try_exchange<F>(
        &self,
        session: &mut ChatSession,
        request: &ChatRequest,
        observe: &mut F,
    ) -> Result<(), ClientError>
    where
        F: AsyncFnMut(&mut ChatSession),
    {
        let resp = self.client.post(&self.url).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(resp).await);
        }

        if !is_ndjson(&resp) {
            let answer: ChatAnswer = resp.json().await?;
            session.apply_answer(answer);
            return Ok(());
        }

        let mut decoder = FrameDecoder::new();
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for frame in decoder.push(&chunk) {
                if apply_frame(session, frame, observe).await {
                    // Nothing follows `done` or `error`; stop reading.
                    return Ok(());
                }
            }
        }
        for frame in decoder.finish() {
            if apply_frame(session, frame, observe).await {
                break;
            }
        }
        if decoder.skipped() > 0 {
            debug!(skipped = decoder.skipped(), "malformed frames skipped");
        }
        Ok(())
    }
}

/// Applies one frame and lets the observer catch up. Returns whether the
/// frame ended the stream.
async fn apply_frame<F>(session: &mut ChatSession, frame: StreamFrame, observe: &mut F) -> bool
where
    F: AsyncFnMut(&mut ChatSession),
{
    let terminal = frame.is_terminal();
    session.apply(frame);
    observe(&mut *session).await;
    terminal
}

fn is_ndjson(resp: &Response) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(NDJSON_CONTENT_TYPE))
}

async fn status_error(resp: Response) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_default();
    ClientError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        Json, Router,
        http::{StatusCode, header},
        routing::post,
    };
    use chat_protocol::NO_IMAGE;

    use crate::{message::Role, session::ERROR_PREFIX};

    use super::*;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn ndjson(frames: &[StreamFrame]) -> ([(header::HeaderName, &'static str); 1], String) {
        let body: String = frames.iter().map(StreamFrame::to_line).collect();
        ([(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)], body)
    }

    async fn run(app: Router, stream: bool) -> (ChatSession, usize) {
        let addr = serve(app).await;
        let transport = ChatTransport::new(&format!("http://{addr}/"), None).unwrap();
        let mut session = ChatSession::new(stream);
        session.set_input("ถามอะไรหน่อย");
        let request = session.submit().unwrap();
        let mut updates = 0usize;
        transport
            .exchange(&mut session, &request, async |_: &mut ChatSession| updates += 1)
            .await;
        (session, updates)
    }

    #[test]
    fn endpoint_must_be_http() {
        assert!(matches!(
            ChatTransport::new("localhost:3000", None),
            Err(ClientError::InvalidEndpoint(_))
        ));
        let t = ChatTransport::new("http://h:1/", None).unwrap();
        assert_eq!(t.url(), "http://h:1/api/chat");
    }

    #[tokio::test]
    async fn streamed_answer_settles_with_image() {
        let reply = ndjson(&[
            StreamFrame::metadata("a.png"),
            StreamFrame::chunk("Hello "),
            StreamFrame::chunk("World"),
            StreamFrame::Done,
        ]);
        let app = Router::new().route(CHAT_PATH, post(move || async move { reply }));
        let (session, updates) = run(app, true).await;

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Bot);
        assert_eq!(last.content, "Hello World");
        assert_eq!(last.image.as_deref(), Some("a.png"));
        assert!(session.can_send());
        assert_eq!(updates, 5);
    }

    #[tokio::test]
    async fn observer_types_each_frame_through_the_session() {
        let reply = ndjson(&[
            StreamFrame::metadata("a.png"),
            StreamFrame::chunk("1 สวัสดี"),
            StreamFrame::chunk(" [https://kku.ac.th](https://kku.ac.th)"),
            StreamFrame::Done,
        ]);
        let app = Router::new().route(CHAT_PATH, post(move || async move { reply }));
        let addr = serve(app).await;
        let transport = ChatTransport::new(&format!("http://{addr}"), None).unwrap();
        let mut session = ChatSession::default();
        session.set_input("q");
        let request = session.submit().unwrap();

        let mut views = Vec::new();
        transport
            .exchange(&mut session, &request, async |s: &mut ChatSession| {
                let mut ticks = 0;
                while s.tick(1) {
                    ticks += 1;
                }
                views.push((
                    ticks,
                    s.display_text(1).unwrap().into_owned(),
                    s.visible_image(1).map(str::to_string),
                ));
            })
            .await;

        let full = "1. สวัสดี [ดูรายละเอียดเพิ่มเติม](https://kku.ac.th)";
        assert_eq!(views[0], (0, String::new(), None));
        assert_eq!(
            views[1],
            ("1 สวัสดี".chars().count(), "1. สวัสดี".to_string(), None)
        );
        assert_eq!(views[2].1, full);
        // Settled: nothing left to type and the image appears.
        assert_eq!(views[3], (0, full.to_string(), Some("a.png".to_string())));
        assert_eq!(views.len(), 5);
    }

    #[tokio::test]
    async fn reading_stops_at_the_terminal_frame() {
        let reply = ndjson(&[
            StreamFrame::metadata(NO_IMAGE),
            StreamFrame::Done,
            StreamFrame::chunk("late"),
        ]);
        let app = Router::new().route(CHAT_PATH, post(move || async move { reply }));
        let (session, updates) = run(app, true).await;

        assert_eq!(session.messages().last().unwrap().content, "");
        // metadata, done, then the closing update; `late` is never applied.
        assert_eq!(updates, 3);
    }

    #[tokio::test]
    async fn error_frame_becomes_localized_text() {
        let reply = ndjson(&[
            StreamFrame::metadata(NO_IMAGE),
            StreamFrame::chunk("Hel"),
            StreamFrame::error("เกิดข้อผิดพลาดในการติดต่อกับ AI"),
        ]);
        let app = Router::new().route(CHAT_PATH, post(move || async move { reply }));
        let (session, _) = run(app, true).await;

        let last = session.messages().last().unwrap();
        assert_eq!(
            last.content,
            format!("{ERROR_PREFIX}เกิดข้อผิดพลาดในการติดต่อกับ AI")
        );
        assert_eq!(last.image, None);
        assert!(session.can_send());
    }

    #[tokio::test]
    async fn single_shot_answer_is_applied() {
        let app = Router::new().route(
            CHAT_PATH,
            post(|| async {
                Json(ChatAnswer {
                    answer: "คำตอบ".into(),
                    image: "b.png".into(),
                })
            }),
        );
        let (session, _) = run(app, false).await;
        let last = session.messages().last().unwrap();
        assert_eq!(last.content, "คำตอบ");
        assert_eq!(last.image.as_deref(), Some("b.png"));
    }

    #[tokio::test]
    async fn server_error_body_is_shown() {
        let app = Router::new().route(
            CHAT_PATH,
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new("API key not configured on server")),
                )
            }),
        );
        let (session, _) = run(app, true).await;
        assert_eq!(
            session.messages().last().unwrap().content,
            format!("{ERROR_PREFIX}API key not configured on server")
        );
        assert!(session.can_send());
    }

    #[tokio::test]
    async fn unreachable_server_fails_softly() {
        // Bind then drop to get a port nobody listens on.
        let addr = {
            let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap()
        };
        let transport = ChatTransport::new(&format!("http://{addr}"), None).unwrap();
        let mut session = ChatSession::default();
        session.set_input("q");
        let request = session.submit().unwrap();
        transport.exchange(&mut session, &request, async |_| {}).await;
        assert!(
            session
                .messages()
                .last()
                .unwrap()
                .content
                .ends_with(crate::error::FETCH_FAILED_MSG)
        );
    }
}

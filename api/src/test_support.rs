//! Scripted model and request helpers for handler tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use ai_llm_service::{
    AiLlmError, ChatModel, LlmModelConfig, LlmProvider, TextStream,
    error_handler::{HttpError, ProviderError, ProviderErrorKind},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use futures_util::StreamExt;
use tower::ServiceExt;

use crate::core::{app_config::AppConfig, app_state::AppState};

/// Provider failure with the given HTTP status.
pub fn provider_err(status: u16) -> AiLlmError {
    ProviderError::new(
        LlmProvider::Gemini,
        ProviderErrorKind::HttpStatus(HttpError {
            status: StatusCode::from_u16(status).unwrap(),
            url: "https://gemini.test".into(),
            snippet: "upstream detail that must not leak".into(),
        }),
    )
    .into()
}

/// What a [`ScriptedModel`] was asked, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenCall {
    pub prompt: String,
    pub system: Option<String>,
    /// Empty for `generate` and `stream`.
    pub options: Vec<String>,
}

/// A [`ChatModel`] that replays canned results and records its calls.
#[derive(Default)]
pub struct ScriptedModel {
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<SeenCall>>,
    /// `None` makes `choose` fail.
    pub choice: Option<String>,
    pub answer: Option<Result<String, u16>>,
    pub fragments: Vec<Result<String, u16>>,
    pub stream_start_error: Option<u16>,
}

impl ScriptedModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenCall> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, prompt: &str, system: Option<&str>, options: &[String]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(SeenCall {
            prompt: prompt.to_string(),
            system: system.map(str::to_string),
            options: options.to_vec(),
        });
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        self.record(prompt, system, &[]);
        match &self.answer {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(status)) => Err(provider_err(*status)),
            None => Ok(String::new()),
        }
    }

    async fn choose(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &[String],
    ) -> Result<String, AiLlmError> {
        self.record(prompt, system, options);
        self.choice.clone().ok_or_else(|| provider_err(500))
    }

    async fn stream(&self, prompt: &str, system: Option<&str>) -> Result<TextStream, AiLlmError> {
        self.record(prompt, system, &[]);
        if let Some(status) = self.stream_start_error {
            return Err(provider_err(status));
        }
        let items: Vec<Result<String, AiLlmError>> = self
            .fragments
            .iter()
            .map(|f| f.clone().map_err(provider_err))
            .collect();
        Ok(futures_util::stream::iter(items).boxed())
    }
}

pub fn config(api_key: Option<&str>) -> AppConfig {
    AppConfig {
        address: "127.0.0.1:0".into(),
        document_path: "unused.txt".into(),
        images: vec!["a.png".into(), "b.png".into()],
        stream_by_default: true,
        llm: LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-test".into(),
            endpoint: "https://gemini.test".into(),
            api_key: api_key.map(str::to_string),
            max_tokens: None,
            temperature: None,
            top_p: None,
            top_k: None,
            timeout_secs: None,
        },
    }
}

pub fn app(model: Arc<ScriptedModel>, api_key: Option<&str>) -> Router {
    crate::router(AppState::new(
        config(api_key),
        Arc::from("เอกสารทดสอบ"),
        model,
    ))
}

/// Sends one request and returns status, content type and body text.
pub async fn call(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, String, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

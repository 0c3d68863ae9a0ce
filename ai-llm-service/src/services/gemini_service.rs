//! Google Gemini service for text generation.
//!
//! Thin client around the Generative Language REST API. Endpoints are derived
//! from `LlmModelConfig::endpoint` and `LlmModelConfig::model`:
//! - POST {endpoint}/v1beta/models/{model}:generateContent              : single response
//! - POST {endpoint}/v1beta/models/{model}:streamGenerateContent?alt=sse: SSE stream
//!
//! The credential is sent in the `x-goog-api-key` header so request URLs can
//! be logged as-is.
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::Gemini`
//! - `cfg.endpoint` must start with http:// or https://
//!
//! A missing `cfg.api_key` is reported per call, not at construction.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{StreamExt, stream::BoxStream};
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    chat_model::{ChatModel, TextStream},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, HttpError, ProviderError, ProviderErrorKind, make_snippet},
    services::sse::SseDecoder,
};

/// Thin client for the Gemini API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_stream: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not Gemini
    /// - [`AiLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(cfg.provider, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/');
        let url_generate = format!("{base}/v1beta/models/{}:generateContent", cfg.model);
        let url_stream = format!("{base}/v1beta/models/{}:streamGenerateContent", cfg.model);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            has_api_key = cfg.has_api_key(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_stream,
        })
    }

    fn api_key(&self) -> Result<&str, AiLlmError> {
        self.cfg
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::new(LlmProvider::Gemini, ProviderErrorKind::MissingApiKey).into()
            })
    }

    /// Sends a request and turns non-2xx statuses into [`ProviderErrorKind::HttpStatus`].
    async fn post(
        &self,
        url: &str,
        body: &GenerateRequest<'_>,
        sse: bool,
    ) -> Result<reqwest::Response, AiLlmError> {
        let key = self.api_key()?;
        let mut req = self
            .client
            .post(url)
            .header("x-goog-api-key", key)
            .json(body);
        if sse {
            req = req.query(&[("alt", "sse")]);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                AiLlmError::Timeout(
                    self.cfg
                        .timeout_secs
                        .map(Duration::from_secs)
                        .unwrap_or_default(),
                )
            } else {
                AiLlmError::from(e)
            }
        })?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);
        error!(
            %status,
            %url,
            %snippet,
            model = %self.cfg.model,
            "Gemini returned non-success status"
        );
        Err(ProviderError::new(
            LlmProvider::Gemini,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }),
        )
        .into())
    }

    async fn generate_once(&self, body: &GenerateRequest<'_>) -> Result<GenerateResponse, AiLlmError> {
        let resp = self.post(&self.url_generate, body, false).await?;
        resp.json::<GenerateResponse>().await.map_err(|e| {
            ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `candidates[0].content.parts`"
                )),
            )
            .into()
        })
    }
}

#[async_trait]
impl ChatModel for GeminiService {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = GenerateRequest::new(system, prompt, GenerationConfig::from_cfg(&self.cfg));

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_generate
        );

        let out = self.generate_once(&body).await?;
        let text = out.text().unwrap_or_default();

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            answer_len = text.len(),
            "generation completed"
        );
        Ok(text)
    }

    async fn choose(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &[String],
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let generation = GenerationConfig {
            temperature: Some(0.0),
            max_output_tokens: Some(32),
            response_mime_type: Some("text/x.enum"),
            response_schema: Some(ResponseSchema {
                kind: "STRING",
                values: options,
            }),
            ..GenerationConfig::default()
        };
        let body = GenerateRequest::new(system, prompt, generation);

        let out = self.generate_once(&body).await?;
        let raw = out.text().ok_or_else(|| {
            ProviderError::new(LlmProvider::Gemini, ProviderErrorKind::EmptyCandidates)
        })?;
        let choice = raw.trim();

        match options.iter().find(|o| o.as_str() == choice) {
            Some(o) => {
                debug!(
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    %choice,
                    "constrained choice completed"
                );
                Ok(o.clone())
            }
            None => Err(ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::Decode(format!("choice `{choice}` is not an allowed option")),
            )
            .into()),
        }
    }

    async fn stream(&self, prompt: &str, system: Option<&str>) -> Result<TextStream, AiLlmError> {
        let body = GenerateRequest::new(system, prompt, GenerationConfig::from_cfg(&self.cfg));

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            "POST {}?alt=sse", self.url_stream
        );

        let resp = self.post(&self.url_stream, &body, true).await?;
        let state = StreamState {
            body: resp.bytes_stream().boxed(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };
        Ok(futures_util::stream::unfold(state, StreamState::next_item).boxed())
    }
}

/* ===========================================================================
SSE stream state
======================================================================== */

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, AiLlmError>>,
    finished: bool,
}

impl StreamState {
    async fn next_item(mut self) -> Option<(Result<String, AiLlmError>, Self)> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                if item.is_err() {
                    // One error ends the stream.
                    self.pending.clear();
                    self.finished = true;
                }
                return Some((item, self));
            }
            if self.finished {
                return None;
            }
            match self.body.next().await {
                Some(Ok(chunk)) => {
                    for payload in self.decoder.push(&chunk) {
                        self.queue_payload(&payload);
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Gemini stream transport error");
                    self.pending.push_back(Err(e.into()));
                }
                None => {
                    self.finished = true;
                    if let Some(payload) = self.decoder.finish() {
                        self.queue_payload(&payload);
                    }
                }
            }
        }
    }

    fn queue_payload(&mut self, payload: &str) {
        match parse_stream_payload(payload) {
            Ok(Some(text)) => self.pending.push_back(Ok(text)),
            Ok(None) => {}
            Err(e) => self.pending.push_back(Err(e)),
        }
    }
}

/// Parses one SSE `data:` payload into its text, if any.
///
/// Gemini reports mid-stream failures as an `{"error": {...}}` payload.
fn parse_stream_payload(payload: &str) -> Result<Option<String>, AiLlmError> {
    let chunk: GenerateResponse = serde_json::from_str(payload).map_err(|e| {
        ProviderError::new(
            LlmProvider::Gemini,
            ProviderErrorKind::Decode(format!("invalid stream payload: {e}")),
        )
    })?;
    if let Some(err) = chunk.error {
        return Err(ProviderError::new(
            LlmProvider::Gemini,
            ProviderErrorKind::Decode(format!(
                "{} {}",
                err.status.unwrap_or_default(),
                err.message.unwrap_or_default()
            )),
        )
        .into());
    }
    Ok(chunk.text().filter(|t| !t.is_empty()))
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

impl<'a> GenerateRequest<'a> {
    fn new(system: Option<&'a str>, prompt: &'a str, generation_config: GenerationConfig<'a>) -> Self {
        Self {
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<ResponseSchema<'a>>,
}

impl GenerationConfig<'_> {
    fn from_cfg(cfg: &LlmModelConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            top_k: cfg.top_k,
            max_output_tokens: cfg.max_tokens,
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseSchema<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "enum")]
    values: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

impl GenerateResponse {
    /// Text of the first candidate, all parts concatenated.
    /// `None` when there is no candidate at all.
    fn text(&self) -> Option<String> {
        let first = self.candidates.first()?;
        Some(
            first
                .content
                .as_ref()
                .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
                .unwrap_or_default(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::FailureClass;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-test".into(),
            endpoint: "https://generativelanguage.googleapis.com/".into(),
            api_key: None,
            max_tokens: Some(100),
            temperature: Some(0.8),
            top_p: Some(0.95),
            top_k: Some(64),
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn urls_are_derived_from_endpoint_and_model() {
        let svc = GeminiService::new(cfg()).unwrap();
        assert_eq!(
            svc.url_generate,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-test:generateContent"
        );
        assert!(svc.url_stream.ends_with("gemini-test:streamGenerateContent"));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let mut c = cfg();
        c.endpoint = "localhost:1234".into();
        assert!(GeminiService::new(c).is_err());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let svc = GeminiService::new(cfg()).unwrap();
        let err = svc.generate("hi", None).await.unwrap_err();
        assert_eq!(err.classify(), FailureClass::InvalidCredential);
    }

    #[test]
    fn request_body_uses_gemini_field_names() {
        let options = vec!["a.png".to_string(), "Not use any image.".to_string()];
        let generation = GenerationConfig {
            response_mime_type: Some("text/x.enum"),
            response_schema: Some(ResponseSchema {
                kind: "STRING",
                values: &options,
            }),
            ..GenerationConfig::from_cfg(&cfg())
        };
        let body = GenerateRequest::new(Some("sys"), "q", generation);
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["generationConfig"]["topK"], 64);
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(v["generationConfig"]["responseSchema"]["enum"][1], "Not use any image.");
    }

    #[test]
    fn response_text_joins_parts_and_tolerates_blocked_candidates() {
        let r: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"สวัสดี"},{"text":" ครับ"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(r.text().as_deref(), Some("สวัสดี ครับ"));

        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(blocked.text().as_deref(), Some(""));

        let none: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(none.text(), None);
    }

    #[test]
    fn stream_payload_errors_are_classified() {
        let err = parse_stream_payload(
            r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .unwrap_err();
        assert_eq!(err.classify(), FailureClass::QuotaExceeded);
        assert!(parse_stream_payload("{not json").is_err());
        assert_eq!(
            parse_stream_payload(r#"{"candidates":[{"content":{"parts":[{"text":"hi"}]}}]}"#)
                .unwrap()
                .as_deref(),
            Some("hi")
        );
    }

    #[tokio::test]
    async fn stream_state_yields_fragments_then_stops_after_error() {
        let chunks: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel")),
            Ok(Bytes::from_static(b"lo \"}]}}]}\r\n\r\ndata: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"World\"}]}}]}\n\n")),
            Ok(Bytes::from_static(b"data: {broken\n\ndata: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"late\"}]}}]}\n")),
        ];
        let state = StreamState {
            body: futures_util::stream::iter(chunks).boxed(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };
        let items: Vec<_> = futures_util::stream::unfold(state, StreamState::next_item)
            .collect()
            .await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_deref().unwrap(), "Hello ");
        assert_eq!(items[1].as_deref().unwrap(), "World");
        assert!(items[2].is_err());
    }
}

//! The seam between request handlers and a concrete model provider.
//!
//! Handlers hold an `Arc<dyn ChatModel>` built once at startup, so tests can
//! swap in a scripted model and production wires [`GeminiService`].
//!
//! [`GeminiService`]: crate::services::gemini_service::GeminiService

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error_handler::AiLlmError;

/// Incremental answer text. Fragments must be concatenated in order.
pub type TextStream = BoxStream<'static, Result<String, AiLlmError>>;

/// A text generation backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Single-shot generation. Returns an empty string when the model produced
    /// a candidate without text (e.g. blocked output).
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError>;

    /// Constrained generation: the answer must be exactly one of `options`.
    ///
    /// # Errors
    /// Returns a decode error if the provider answers outside the set.
    async fn choose(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &[String],
    ) -> Result<String, AiLlmError>;

    /// Streaming generation. The returned stream ends after the last fragment
    /// or after yielding one error.
    async fn stream(&self, prompt: &str, system: Option<&str>) -> Result<TextStream, AiLlmError>;
}

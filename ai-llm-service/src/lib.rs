//! Shared model service for the campus chat backend.
//!
//! - [`ChatModel`] is the provider-agnostic seam used by request handlers.
//! - [`GeminiService`] implements it over the Gemini REST API, including
//!   enum-constrained output and SSE streaming.
//! - [`AiLlmError::classify`] reduces provider failures to a small set of
//!   [`FailureClass`]es that are safe to show to end users.
//! - [`telemetry`] provides the tracing layer used by the binaries.

pub mod chat_model;
pub mod config;
pub mod error_handler;
pub mod services;
pub mod telemetry;

pub use chat_model::{ChatModel, TextStream};
pub use config::default_config::config_gemini_answer;
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, FailureClass};
pub use services::gemini_service::GeminiService;

//! Default Gemini configs loaded from environment variables.
//!
//! One model config serves both calls of a chat turn; constrained choices
//! override sampling per request (see `GeminiService::choose`).
//!
//! # Environment variables
//!
//! - `GEMINI_API_KEY`   = credential (optional here; see below)
//! - `GEMINI_MODEL`     = model name (default [`DEFAULT_GEMINI_MODEL`])
//! - `GEMINI_ENDPOINT`  = API base (default [`DEFAULT_GEMINI_ENDPOINT`])
//! - `LLM_MAX_TOKENS`   = max output tokens (default 8192)
//! - `LLM_TEMPERATURE`  = answer temperature (default 0.8)
//! - `LLM_TIMEOUT_SECS` = HTTP timeout (default 120)
//!
//! A missing credential is **not** an error here: the server must still start,
//! log the condition, and answer each request with a configuration error.

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_f32, env_opt_u32, env_opt_u64, opt_env,
        validate_http_endpoint, validate_range_f32,
    },
};

/// Model used when `GEMINI_MODEL` is unset.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-thinking-exp-01-21";

/// Public Generative Language API base.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_TEMPERATURE: f32 = 0.8;
const DEFAULT_TOP_P: f32 = 0.95;
const DEFAULT_TOP_K: u32 = 64;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

fn gemini_base() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = opt_env("GEMINI_ENDPOINT").unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.into());
    validate_http_endpoint("GEMINI_ENDPOINT", &endpoint)?;

    let model = opt_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into());
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model,
        endpoint,
        api_key: opt_env("GEMINI_API_KEY"),
        max_tokens: Some(env_opt_u32("LLM_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS)),
        temperature: Some(DEFAULT_TEMPERATURE),
        top_p: Some(DEFAULT_TOP_P),
        top_k: Some(DEFAULT_TOP_K),
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Constructs the config for the **answer** model.
///
/// # Errors
/// - [`ConfigError::InvalidFormat`] if `GEMINI_ENDPOINT` is not http(s)
/// - [`ConfigError::InvalidNumber`] / [`ConfigError::OutOfRange`] for bad numeric knobs
pub fn config_gemini_answer() -> Result<LlmModelConfig, AiLlmError> {
    let mut cfg = gemini_base()?;
    if let Some(t) = env_opt_f32("LLM_TEMPERATURE")? {
        validate_range_f32("temperature", t, 0.0, 2.0)?;
        cfg.temperature = Some(t);
    }
    Ok(cfg)
}

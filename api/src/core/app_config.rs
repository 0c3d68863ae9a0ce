//! Server configuration, built once at startup and passed down explicitly.

use std::path::PathBuf;

use ai_llm_service::{AiLlmError, LlmModelConfig, config_gemini_answer, error_handler::opt_env};

/// Illustrations the model may pick from when `CHAT_IMAGES` is unset.
pub const DEFAULT_IMAGES: &[&str] = &[
    "kku_campus_map.png",
    "kku_engineering_building.png",
    "kku_admission_calendar.png",
];

/// Everything the HTTP layer needs to know about its environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listener address, e.g. `0.0.0.0:3000`.
    pub address: String,
    /// Plain-text document injected into every prompt.
    pub document_path: PathBuf,
    /// Candidate illustration file names (without the "no image" sentinel).
    pub images: Vec<String>,
    /// Whether requests that omit `stream` get a streamed answer.
    pub stream_by_default: bool,
    /// Model settings, credential included.
    pub llm: LlmModelConfig,
}

impl AppConfig {
    /// Load from environment variables with defaults.
    ///
    /// A missing `GEMINI_API_KEY` is accepted here; see [`Self::credential_configured`].
    ///
    /// # Errors
    /// Propagates invalid model knobs from [`config_gemini_answer`].
    pub fn from_env() -> Result<Self, AiLlmError> {
        Ok(Self {
            address: opt_env("API_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".into()),
            document_path: opt_env("DOCUMENT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public").join("documents.txt")),
            images: opt_env("CHAT_IMAGES")
                .map(|v| parse_images(&v))
                .unwrap_or_else(|| DEFAULT_IMAGES.iter().map(|s| s.to_string()).collect()),
            stream_by_default: opt_env("CHAT_STREAM_DEFAULT")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
            llm: config_gemini_answer()?,
        })
    }

    pub fn credential_configured(&self) -> bool {
        self.llm.has_api_key()
    }
}

fn parse_images(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

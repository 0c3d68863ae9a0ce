use std::sync::Arc;

use ai_llm_service::ChatModel;

use crate::core::app_config::AppConfig;

/// Shared, read-only state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Context document, loaded once.
    pub document: Arc<str>,
    /// Model backend.
    pub model: Arc<dyn ChatModel>,
}

impl AppState {
    pub fn new(config: AppConfig, document: Arc<str>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            config,
            document,
            model,
        }
    }

    /// Allowed answers for the image pick: configured images plus the sentinel.
    pub fn image_options(&self) -> Vec<String> {
        let mut opts = self.config.images.clone();
        opts.push(chat_protocol::NO_IMAGE.to_string());
        opts
    }
}

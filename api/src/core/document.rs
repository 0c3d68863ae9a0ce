//! Static retrieval context.

use std::{path::Path, sync::Arc};

use tracing::{error, info};

/// Reads the context document once.
///
/// A missing or unreadable file degrades to an empty context: the server keeps
/// running and the model answers from its own knowledge.
pub async fn load_document(path: &Path) -> Arc<str> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            info!(path = %path.display(), chars = text.chars().count(), "loaded context document");
            Arc::from(text)
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to read context document, continuing without context");
            Arc::from("")
        }
    }
}

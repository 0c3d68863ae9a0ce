use serde::{Deserialize, Serialize};

/// Sentinel image value meaning "no illustration for this answer".
pub const NO_IMAGE: &str = "Not use any image.";

/// One unit of a streamed answer.
///
/// On the wire each frame is a JSON object tagged by `type`, written on its
/// own line. A well-formed stream is one `Metadata`, zero or more `Chunk`s
/// and a final `Done`, or it stops early with a single `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
    /// Image chosen for the answer (file name or [`NO_IMAGE`]).
    Metadata { image: String },
    /// Next fragment of answer text; order matters.
    Chunk { content: String },
    /// Answer complete.
    Done,
    /// Localized, user-facing failure text.
    Error { error: String },
}

impl StreamFrame {
    pub fn metadata(image: impl Into<String>) -> Self {
        Self::Metadata {
            image: image.into(),
        }
    }

    pub fn chunk(content: impl Into<String>) -> Self {
        Self::Chunk {
            content: content.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// True for frames after which nothing else is sent.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    /// Serializes the frame as one NDJSON line (trailing `\n` included).
    pub fn to_line(&self) -> String {
        // Enum of strings: serialization cannot fail.
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"));
        line.push('\n');
        line
    }
}

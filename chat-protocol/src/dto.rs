use serde::{Deserialize, Serialize};

/// Request payload for `POST /api/chat`.
///
/// `question` is optional at the serde level so that a body without it is a
/// "no question" error rather than a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
    /// Ask for a streamed answer. The server default applies when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>, stream: Option<bool>) -> Self {
        Self {
            question: Some(question.into()),
            stream,
        }
    }

    /// The question with surrounding whitespace removed, or `None` if blank.
    pub fn trimmed_question(&self) -> Option<&str> {
        self.question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Non-streaming success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    /// Chosen image file name, or [`NO_IMAGE`](crate::NO_IMAGE).
    pub image: String,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

use thiserror::Error;

/// Shown when the server could not be reached or sent no usable error text.
pub const FETCH_FAILED_MSG: &str = "Error fetching response from API";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx reply; `message` is the server's `error` text when present.
    #[error("server replied {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

impl ClientError {
    /// Text suitable for the conversation view.
    pub fn user_message(&self) -> &str {
        match self {
            ClientError::Status { message, .. } if !message.trim().is_empty() => message,
            _ => FETCH_FAILED_MSG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_text_is_preferred() {
        let e = ClientError::Status {
            status: 429,
            message: "โควต้าเต็ม".into(),
        };
        assert_eq!(e.user_message(), "โควต้าเต็ม");

        let e = ClientError::Status {
            status: 502,
            message: " ".into(),
        };
        assert_eq!(e.user_message(), FETCH_FAILED_MSG);
        assert_eq!(
            ClientError::InvalidEndpoint("x".into()).user_message(),
            FETCH_FAILED_MSG
        );
    }
}

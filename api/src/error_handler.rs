use ai_llm_service::{AiLlmError, FailureClass};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chat_protocol::ErrorBody;
use thiserror::Error;

/// Fixed reply when the provider credential is absent.
pub const MISSING_CREDENTIAL_MSG: &str = "API key not configured on server";
pub const INVALID_BODY_MSG: &str = "Invalid request body";
pub const NO_QUESTION_MSG: &str = "No question provided";
pub const METHOD_NOT_ALLOWED_MSG: &str = "Method Not Allowed. Use POST.";

pub const INVALID_CREDENTIAL_MSG: &str =
    "API Key ที่กำหนดค่าไว้สำหรับ Gemini ไม่ถูกต้อง (Invalid API Key configured for Gemini.)";
pub const QUOTA_EXCEEDED_MSG: &str =
    "เกินโควต้าการใช้งาน Gemini API แล้ว (Exceeded Gemini API quota.)";
pub const GENERIC_FAILURE_MSG: &str =
    "เกิดข้อผิดพลาดในการสร้างคำตอบจากโมเดล AI (Error generating response from AI model)";

/// Localized text shown to users for a provider failure.
pub fn provider_message(class: FailureClass) -> &'static str {
    match class {
        FailureClass::InvalidCredential => INVALID_CREDENTIAL_MSG,
        FailureClass::QuotaExceeded => QUOTA_EXCEEDED_MSG,
        FailureClass::Generic => GENERIC_FAILURE_MSG,
    }
}

fn provider_message_for(class: &FailureClass) -> &'static str {
    provider_message(*class)
}

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("{}", MISSING_CREDENTIAL_MSG)]
    MissingCredential,

    #[error("{}", INVALID_BODY_MSG)]
    InvalidBody,

    #[error("{}", NO_QUESTION_MSG)]
    NoQuestion,

    #[error("{}", METHOD_NOT_ALLOWED_MSG)]
    MethodNotAllowed,

    /// Model call failed; only the class survives.
    #[error("{}", provider_message_for(.0))]
    Provider(FailureClass),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidBody | AppError::NoQuestion => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::MissingCredential | AppError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // startup-only
            AppError::Llm(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to put in a response body.
    fn public_message(&self) -> String {
        match self {
            AppError::Llm(_) | AppError::Bind(_) | AppError::Server(_) => {
                GENERIC_FAILURE_MSG.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<&AiLlmError> for AppError {
    fn from(err: &AiLlmError) -> Self {
        AppError::Provider(err.classify())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::new(self.public_message()))).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

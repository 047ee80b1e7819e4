// Type definitions and error enums

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant"
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Startup-time configuration failures. Never produced while serving a request.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required credential: {0}")]
    MissingCredential(String),

    #[error("Incomplete {platform} credentials, missing: {missing}")]
    PartialCredentials { platform: String, missing: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Malformed input for a format the extractor supports.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("OCR failed: {0}")]
    Ocr(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Extraction failed for {filename}: {source}")]
    Extraction {
        filename: String,
        #[source]
        source: ExtractionError,
    },

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Extraction { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LLMApi(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = match &self {
            AppError::InvalidRequest(message) => message.clone(),
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

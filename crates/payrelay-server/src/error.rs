use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use payrelay::{Environment, RelayError};

/// Generic message returned in place of internal details in production.
const REDACTED_MESSAGE: &str = "Something went wrong";

/// HTTP-facing error for the tokenization routes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing fields or unknown payment type
    #[error("{0}")]
    Validation(String),
    /// Provider refused the payment method
    #[error("tokenization failed: {0}")]
    Tokenization(String),
    /// Anything unexpected. `message` is already redacted for production.
    #[error("internal error: {detail}")]
    Internal { detail: String, message: String },
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("endpoint not found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn from_relay(err: RelayError, environment: Environment) -> Self {
        match err {
            RelayError::Validation(msg) => ApiError::Validation(msg),
            RelayError::Provider(reason) => ApiError::Tokenization(reason),
            RelayError::Internal(detail) => ApiError::internal(detail, environment),
        }
    }

    pub fn internal(detail: impl Into<String>, environment: Environment) -> Self {
        let detail = detail.into();
        let message = if environment.is_production() {
            REDACTED_MESSAGE.to_string()
        } else {
            detail.clone()
        };
        ApiError::Internal { detail, message }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Tokenization(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(msg) => serde_json::json!({ "error": msg }),
            ApiError::Tokenization(reason) => serde_json::json!({
                "error": "Tokenization failed",
                "details": reason
            }),
            ApiError::Internal { detail, message } => {
                tracing::error!(error = %detail, "tokenization process failed");
                serde_json::json!({
                    "error": "Internal server error during tokenization",
                    "message": message
                })
            }
            ApiError::MethodNotAllowed => serde_json::json!({ "error": "Method Not Allowed" }),
            ApiError::NotFound(path) => serde_json::json!({
                "error": "Endpoint not found",
                "path": path
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

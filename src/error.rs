use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Ticket issuance failures. Discriminants are the provider's documented error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("appID invalid")]
    AppIdInvalid = 1,

    #[error("userID invalid")]
    UserIdInvalid = 3,

    #[error("secret must be a 32 byte string")]
    SecretInvalid = 5,

    #[error("effectiveTimeInSeconds invalid")]
    LifetimeInvalid = 6,

    #[error("ticket encryption failed")]
    Encryption = 100,
}

impl TokenError {
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Deployment mistakes (app id, secret) as opposed to a bad request.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TokenError::AppIdInvalid | TokenError::SecretInvalid | TokenError::Encryption
        )
    }
}

/// Failures of the provider admin API. Logged by callers, never surfaced to clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected request: code={code} message={message}")]
    Rejected { code: i64, message: String },

    #[error("request signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Token(err) if err.is_configuration() => {
                tracing::error!(error = %err, code = err.code(), "Ticket issuer misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Token(err) => (StatusCode::BAD_REQUEST, err.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::security::validate::FieldError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant maps to a structured `{success: false, error: ...}` body;
/// internal details are logged server-side and never leak to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid content type")]
    InvalidContentType,

    #[error("Invalid request body")]
    Parse,

    #[error("{0}")]
    Validation(FieldError),

    #[error("Too many requests")]
    RateLimited { retry_after: u64 },

    #[error("Forbidden")]
    Forbidden,

    #[error("Payment verification failed")]
    PaymentDeclined,

    #[error("Payment service unavailable: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::Validation(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidContentType => {
                (StatusCode::BAD_REQUEST, "Invalid content type".to_string())
            }
            AppError::Parse => (StatusCode::BAD_REQUEST, "Invalid request body".to_string()),
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.message()),
            AppError::RateLimited { retry_after } => {
                let body = Json(json!({
                    "success": false,
                    "error": "Too many requests",
                    "retry_after": retry_after,
                }));
                return (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::PaymentDeclined => (
                StatusCode::UNAUTHORIZED,
                "Payment verification failed".to_string(),
            ),
            AppError::Upstream(detail) => {
                tracing::error!("Upstream gateway error: {detail}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Payment service unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A processing error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

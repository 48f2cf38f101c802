//! HTTP error mapping for API handlers.

use crate::AppError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Wrapper that turns [`AppError`] into an HTTP response.
///
/// Client errors carry their message; server errors are logged in full and
/// answered with a generic body.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(value: JsonRejection) -> Self {
        Self(AppError::InvalidArgument(format!(
            "Invalid request body: {}",
            value.body_text()
        )))
    }
}

impl HttpError {
    /// Status code this error maps to.
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::InvalidArgument(_) | AppError::InvalidExpiryFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Expired => StatusCode::GONE,
            AppError::IdGenerationExhausted { .. } | AppError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("Internal error: {}", self.0);
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

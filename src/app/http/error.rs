//! HTTP error handling: the single place where error kinds become status codes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::ErrorResponse;
use crate::utils::error::{ErrorCategory, GatewayError};

#[derive(Debug)]
pub struct AppError(pub GatewayError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Remote | ErrorCategory::Configuration | ErrorCategory::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            GatewayError::RemoteError { kind, detail } => {
                tracing::error!("❌ Remote failure ({:?}): {}", kind, detail);
            }
            err if status.is_server_error() => tracing::error!("❌ Request failed: {}", err),
            err => tracing::warn!("🔶 Request rejected ({}): {}", status, err),
        }

        let body = ErrorResponse {
            error: self.0.user_friendly_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(GatewayError::MalformedRequestError {
            message: rejection.body_text(),
        })
    }
}

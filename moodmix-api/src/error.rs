//! Error types for moodmix-api
//!
//! Pipeline failures keep their own status codes; everything else maps onto
//! the generic request/server errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::PipelineError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Playlist pipeline failure
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// moodmix-common error
    #[error("Common error: {0}")]
    Common(#[from] moodmix_common::Error),
}

impl ApiError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Pipeline(err) => {
                let status = match err {
                    PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
                    PipelineError::AuthFailure(_) => StatusCode::BAD_GATEWAY,
                    PipelineError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    PipelineError::UpstreamProtocol { .. } => StatusCode::BAD_GATEWAY,
                    PipelineError::NoCandidates(_) => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, err.kind())
            }
            ApiError::Common(moodmix_common::Error::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ApiError::Common(moodmix_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Common(moodmix_common::Error::Database(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = match &self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
            ApiError::Pipeline(err) => err.to_string(),
            ApiError::Common(err) => err.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

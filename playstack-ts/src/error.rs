//! Error types for playstack-ts
//!
//! JSON endpoints answer with `{"error": {"code", "message"}}`; the HTML form
//! handler renders the same error as a page with the same status.

use crate::pipeline::PipelineFailure;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use playstack_common::acquire::AcquireError;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Form rejected before the pipeline started (400)
    #[error("{0}")]
    Input(#[from] AcquireError),

    /// Malformed or oversized multipart body
    #[error("Invalid upload: {}", .0.body_text())]
    Multipart(#[from] MultipartError),

    /// A pipeline stage failed
    #[error("{0}")]
    Pipeline(Box<PipelineFailure>),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// playstack-common error (job directories, artifact reads)
    #[error("Common error: {0}")]
    Common(#[from] playstack_common::Error),
}

impl From<PipelineFailure> for ApiError {
    fn from(failure: PipelineFailure) -> Self {
        ApiError::Pipeline(Box::new(failure))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Input(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Pipeline(failure) if failure.error.is_input_error() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) | ApiError::Internal(_) | ApiError::Common(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            ApiError::Multipart(_) => "BAD_REQUEST",
            ApiError::Input(_) => "INVALID_INPUT",
            ApiError::Pipeline(failure) if failure.error.is_input_error() => "INVALID_INPUT",
            ApiError::Pipeline(failure) if failure.error.is_config_error() => "CONFIG_ERROR",
            ApiError::Pipeline(_) => "STAGE_FAILED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Common(_) => "COMMON_ERROR",
        }
    }

    /// Message for the user; pipeline failures carry tool output
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Pipeline(failure) => failure.error.user_detail(),
            ApiError::Multipart(e) => e.body_text(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut error = json!({
            "code": self.error_code(),
            "message": self.user_message(),
        });
        let mut body = json!({});
        if let ApiError::Pipeline(failure) = &self {
            error["stage"] = json!(failure.stage.label());
            body["report"] = json!(failure.report);
        }
        body["error"] = error;

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

//! Error types for playstack-vr
//!
//! Every error surfaces as an HTML error page; `status_code` picks the
//! response status.

use crate::pipeline::PipelineFailure;
use axum::{extract::multipart::MultipartError, http::StatusCode};
use playstack_common::acquire::AcquireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Form rejected before the pipeline started (400)
    #[error("{0}")]
    Input(#[from] AcquireError),

    #[error("Invalid upload: {}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    Pipeline(Box<PipelineFailure>),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

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

    pub fn user_message(&self) -> String {
        match self {
            ApiError::Pipeline(failure) => failure.error.user_detail(),
            ApiError::Multipart(e) => e.body_text(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

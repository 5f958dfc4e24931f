//! Error types for the CCCD OCR server

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::export::ExportError;
use crate::ocr::{OcrError, TimeoutPhase};
use crate::preprocess::PreprocessError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Seconds a client should wait before retrying a transient failure
const RETRY_AFTER_SECS: &str = "5";

/// Request-boundary error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No image uploaded")]
    MissingImage,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload too large")]
    UploadTooLarge,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("All OCR slots are busy")]
    ConcurrencyLimited,

    #[error("OCR request timed out during {0}")]
    DownstreamTimeout(TimeoutPhase),

    #[error("OCR service is overloaded")]
    DownstreamOverloaded,

    #[error("OCR failed: {0}")]
    DownstreamProcessing(String),

    #[error("Invalid OCR response: {0}")]
    InvalidOcrResponse(String),

    #[error("No text recognized")]
    NoTextRecognized,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingImage
            | Self::InvalidUpload(_)
            | Self::DownstreamProcessing(_)
            | Self::InvalidOcrResponse(_)
            | Self::NoTextRecognized => StatusCode::BAD_REQUEST,
            Self::UploadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited | Self::ConcurrencyLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::DownstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::DownstreamOverloaded => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the same request may succeed if simply retried later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::ConcurrencyLimited
                | Self::DownstreamTimeout(_)
                | Self::DownstreamOverloaded
        )
    }

    /// User-facing message and optional detail.
    ///
    /// Only internal errors expose their raw message.
    fn payload(&self) -> (String, Option<String>) {
        match self {
            Self::MissingImage => ("No image uploaded".to_string(), None),
            Self::InvalidUpload(detail) => {
                ("Could not read the uploaded image".to_string(), Some(detail.clone()))
            }
            Self::UploadTooLarge => ("Uploaded image is too large".to_string(), None),
            Self::RateLimited => (
                "The system is busy, please try again in a moment".to_string(),
                None,
            ),
            Self::ConcurrencyLimited => (
                "Not your turn yet, please retry in a few seconds".to_string(),
                None,
            ),
            Self::DownstreamTimeout(phase) => (
                "The OCR service took too long to respond, please resubmit the image".to_string(),
                Some(format!("{} timeout", phase)),
            ),
            Self::DownstreamOverloaded => (
                "The OCR service is busy, please retry later".to_string(),
                None,
            ),
            Self::DownstreamProcessing(message) => {
                ("OCR failed".to_string(), Some(message.clone()))
            }
            Self::InvalidOcrResponse(detail) => {
                ("Invalid OCR response".to_string(), Some(detail.clone()))
            }
            Self::NoTextRecognized => (
                "No text could be recognized in the image, please upload a clearer photo"
                    .to_string(),
                None,
            ),
            Self::Internal(message) => (message.clone(), None),
        }
    }
}

impl From<OcrError> for AppError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::Timeout(phase) => Self::DownstreamTimeout(phase),
            OcrError::Overloaded => Self::DownstreamOverloaded,
            OcrError::Processing(message) => Self::DownstreamProcessing(message),
            OcrError::InvalidResponse(detail) => Self::InvalidOcrResponse(detail),
            OcrError::ApiError(_) | OcrError::Io(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<PreprocessError> for AppError {
    fn from(e: PreprocessError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", self);
        }

        let (error, message) = self.payload();
        let body = Json(ErrorResponse { error, message });

        if self.is_retryable() {
            (status, [(header::RETRY_AFTER, RETRY_AFTER_SECS)], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

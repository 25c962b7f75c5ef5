// Error type shared by the HTTP layer

use std::time::Duration;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::extraction::ExtractionError;
use crate::models::ErrorResponse;

pub const UNSUPPORTED_TYPE_MESSAGE: &str = "Only PDF and DOC/DOCX files are supported";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", UNSUPPORTED_TYPE_MESSAGE)]
    UnsupportedContentType { content_type: Option<String> },

    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid form: {0}")]
    InvalidForm(#[from] MultipartRejection),

    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedContentType { .. } | AppError::MissingFile => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidForm(rejection) => rejection.status(),
            AppError::Upload(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AppError::Upload(_)
            | AppError::Extraction(_)
            | AppError::Timeout(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message returned to clients in the `detail` field.
    pub fn detail(&self) -> String {
        match self {
            AppError::UnsupportedContentType { .. } | AppError::MissingFile => self.to_string(),
            AppError::Extraction(err) => err.to_string(),
            AppError::InvalidForm(rejection) => {
                format!("Error processing document: {}", rejection.body_text())
            }
            AppError::Upload(err) => format!("Error processing document: {}", err.body_text()),
            AppError::Timeout(_) => format!("Error processing document: {self}"),
            AppError::Internal(msg) => format!("Error processing document: {msg}"),
        }
    }
}

/// Render the full `source()` chain for server-side logs.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %error_chain(&self), "Error processing document");
        } else {
            match &self {
                AppError::UnsupportedContentType { content_type } => {
                    warn!(status = status.as_u16(), content_type = ?content_type, "Rejected upload")
                }
                _ => warn!(status = status.as_u16(), error = %error_chain(&self), "Rejected upload"),
            }
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

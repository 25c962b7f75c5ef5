//! `POST /extract-text`
//!
//! Reads the `file` part of a multipart form, picks an extractor from the part's declared
//! content type, and returns the extracted text as `{"text": ...}`.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::{routing::post, Json, Router};
use tracing::{info, warn};

use crate::extraction::{is_legacy_word, DocumentFormat};
use crate::models::{AppState, ExtractTextResponse};
use crate::types::{AppError, AppResult};
use crate::upload::UploadedDocument;

const FILE_FIELD: &str = "file";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/extract-text", post(extract_text))
        .with_state(state)
}

async fn extract_text(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ExtractTextResponse>> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            // Drain fields we do not use.
            let _ = field.bytes().await?;
            continue;
        }

        let mut upload = state.uploads.open(field.file_name(), field.content_type());
        let format = route(&upload)?;

        upload.set_data(field.bytes().await?);
        info!(
            filename = upload.display_name(),
            content_type = upload.content_type().unwrap_or_default(),
            bytes = upload.len(),
            "Extracting text"
        );

        return run_extraction(&state, upload, format).await.map(Json);
    }

    Err(AppError::MissingFile)
}

/// Pick the extractor for an upload from its declared content type alone.
fn route(upload: &UploadedDocument) -> AppResult<DocumentFormat> {
    let content_type = upload.content_type().unwrap_or_default();
    let format = DocumentFormat::from_content_type(content_type).ok_or_else(|| {
        AppError::UnsupportedContentType {
            content_type: upload.content_type().map(str::to_string),
        }
    })?;

    if is_legacy_word(content_type) {
        warn!(
            filename = upload.display_name(),
            "Legacy .doc upload routed to the DOCX extractor; binary Word files cannot be read"
        );
    }
    Ok(format)
}

/// Run the extractor on the blocking pool, bounded by the configured timeout.
///
/// The upload moves into the blocking task and is released when extraction ends, even
/// if the request has already timed out.
async fn run_extraction(
    state: &AppState,
    upload: UploadedDocument,
    format: DocumentFormat,
) -> AppResult<ExtractTextResponse> {
    let extractor = state.extractors.for_format(format);
    let timeout = state.config.extraction.timeout;
    let filename = upload.display_name().to_string();

    let task = tokio::task::spawn_blocking(move || {
        let result = extractor.extract(upload.data());
        drop(upload);
        result
    });

    let text = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| AppError::Timeout(timeout))?
        .map_err(|e| AppError::Internal(format!("extraction task failed: {e}")))??;

    if text.is_empty() {
        info!(filename = %filename, format = %format, "No text extracted");
        return Ok(ExtractTextResponse::nothing_extracted(&filename));
    }

    info!(filename = %filename, format = %format, chars = text.chars().count(), "Text extracted");
    Ok(ExtractTextResponse { text })
}

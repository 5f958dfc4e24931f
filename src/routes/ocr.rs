//! OCR upload route

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub excel_url: String,
}

/// Recognize the uploaded identity card and export its text
pub async fn ocr(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected non-multipart upload: {}", e);
        AppError::MissingImage
    })?;

    let image = read_image(&mut multipart)
        .await?
        .ok_or(AppError::MissingImage)?;

    let outcome = state.pipeline().run(&image).await?;

    Ok(Json(OcrResponse {
        excel_url: outcome.artifact.download_url(),
        text: outcome.text,
    }))
}

/// Bytes of the first non-empty `image` field
async fn read_image(multipart: &mut Multipart) -> Result<Option<Bytes>> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or("").to_string();
        if name != IMAGE_FIELD {
            tracing::debug!("Ignoring multipart field '{}'", name);
            continue;
        }

        tracing::debug!(
            "Received image: filename={:?}, content_type={:?}",
            field.file_name(),
            field.content_type()
        );

        let data = field.bytes().await.map_err(upload_error)?;
        if !data.is_empty() {
            return Ok(Some(data));
        }
    }

    Ok(None)
}

fn upload_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge
    } else {
        tracing::warn!("Failed to read upload: {}", e);
        AppError::InvalidUpload(e.body_text())
    }
}

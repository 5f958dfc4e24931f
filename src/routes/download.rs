//! Export download route

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use super::cors::not_found;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Serve a generated workbook as an attachment
pub async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response> {
    let Some(path) = state.exporter().resolve(&name) else {
        tracing::debug!(name = %name, "Unknown export requested");
        return Ok(not_found());
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        // Swept between resolve and read
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(not_found()),
        Err(e) => return Err(e.into()),
    };

    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}

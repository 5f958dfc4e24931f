//! Optional image pre-processing before OCR.
//!
//! Identity cards are landscape documents; phone photos often arrive in
//! portrait. [`AutoRotate`] turns those a quarter turn in place so the OCR
//! service reads lines in the right direction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, ImageReader};

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Failed to rewrite image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preprocessing task failed: {0}")]
    Task(String),
}

/// Step applied to the staged upload before it is sent for recognition
#[async_trait]
pub trait ImagePreprocessor: Send + Sync {
    /// Rewrite the image at `path` in place if needed.
    ///
    /// Returns whether the file was changed.
    async fn prepare(&self, path: &Path) -> Result<bool, PreprocessError>;
}

/// Rotates portrait images 90° clockwise
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoRotate;

#[async_trait]
impl ImagePreprocessor for AutoRotate {
    async fn prepare(&self, path: &Path) -> Result<bool, PreprocessError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || rotate_if_portrait(&path))
            .await
            .map_err(|e| PreprocessError::Task(e.to_string()))?
    }
}

fn rotate_if_portrait(path: &Path) -> Result<bool, PreprocessError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let Some(format) = reader.format() else {
        tracing::debug!(path = %path.display(), "Unknown image format, skipping rotation");
        return Ok(false);
    };

    // Undecodable uploads go to the OCR service untouched
    let image = match reader.decode() {
        Ok(image) => image,
        Err(e) => {
            tracing::debug!(path = %path.display(), "Cannot decode image, skipping rotation: {}", e);
            return Ok(false);
        }
    };

    if image.height() <= image.width() {
        return Ok(false);
    }

    let rotated = image.rotate90();
    let rotated = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(rotated.to_rgb8()),
        _ => rotated,
    };
    rotated.save_with_format(path, format)?;

    tracing::debug!(
        path = %path.display(),
        width = rotated.width(),
        height = rotated.height(),
        "Rotated portrait upload"
    );
    Ok(true)
}

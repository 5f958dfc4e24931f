//! OCR Request Pipeline
//!
//! Runs one uploaded image through admission, staging, recognition,
//! normalization and export:
//!
//! ```text
//! Received -> Admitted | Rejected
//! Admitted -> Processing -> Completed | Failed -> Released
//! ```
//!
//! A rejected request holds nothing and stages nothing. An admitted request
//! owns an [`OcrJob`] whose drop deletes the staged upload and frees the
//! backend slot on every exit path.

mod job;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

pub use job::OcrJob;

use crate::admission::{AdmissionController, AdmissionDecision};
use crate::error::{AppError, Result};
use crate::export::{ExportArtifact, SpreadsheetExporter};
use crate::normalize::NormalizationRules;
use crate::ocr::OcrProviderTrait;
use crate::preprocess::ImagePreprocessor;

/// Successful pipeline output
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    pub job_id: Uuid,
    /// Normalized text
    pub text: String,
    pub artifact: ExportArtifact,
}

/// Orchestrates a single OCR request
pub struct OcrPipeline {
    admission: AdmissionController,
    provider: Arc<dyn OcrProviderTrait>,
    preprocessor: Option<Arc<dyn ImagePreprocessor>>,
    rules: Arc<NormalizationRules>,
    exporter: SpreadsheetExporter,
    upload_dir: PathBuf,
}

impl OcrPipeline {
    pub fn new(
        admission: AdmissionController,
        provider: Arc<dyn OcrProviderTrait>,
        rules: Arc<NormalizationRules>,
        exporter: SpreadsheetExporter,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            admission,
            provider,
            preprocessor: None,
            rules,
            exporter,
            upload_dir,
        }
    }

    /// Run `preprocessor` on every staged upload before recognition
    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn ImagePreprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn exporter(&self) -> &SpreadsheetExporter {
        &self.exporter
    }

    /// Process `image` arriving now
    pub async fn run(&self, image: &[u8]) -> Result<OcrOutcome> {
        self.run_at(image, Instant::now()).await
    }

    /// Process `image` as if it arrived at `now`
    pub async fn run_at(&self, image: &[u8], now: Instant) -> Result<OcrOutcome> {
        let job_id = Uuid::new_v4();

        let permit = match self.admission.admit(now) {
            AdmissionDecision::Admitted(permit) => permit,
            AdmissionDecision::RateLimited => {
                tracing::warn!(
                    job_id = %job_id,
                    limit = self.admission.rate_limiter().limit(),
                    window_secs = self.admission.rate_limiter().window().as_secs(),
                    "Rejected by rate limiter"
                );
                return Err(AppError::RateLimited);
            }
            AdmissionDecision::ConcurrencyLimited => {
                tracing::warn!(
                    job_id = %job_id,
                    slots = self.admission.slot_limiter().capacity(),
                    "Rejected by concurrency limiter"
                );
                return Err(AppError::ConcurrencyLimited);
            }
        };

        let job = OcrJob::stage(job_id, permit, &self.upload_dir, image).await?;
        tracing::debug!(job_id = %job_id, bytes = image.len(), "Upload staged");

        let raw_text = self.recognize(&job).await?;

        // Slot and staged file are no longer needed once the backend answered
        drop(job);

        let text = self.rules.apply(&raw_text);
        if text.is_empty() {
            tracing::warn!(job_id = %job_id, "OCR returned no text");
            return Err(AppError::NoTextRecognized);
        }

        let artifact = self.exporter.export(&text).await?;

        tracing::info!(
            job_id = %job_id,
            chars = text.chars().count(),
            export = %artifact.name,
            "OCR job completed"
        );

        Ok(OcrOutcome {
            job_id,
            text,
            artifact,
        })
    }

    async fn recognize(&self, job: &OcrJob) -> Result<String> {
        if let Some(preprocessor) = &self.preprocessor {
            if preprocessor.prepare(job.path()).await? {
                tracing::debug!(job_id = %job.id(), "Upload preprocessed");
            }
        }

        let started = Instant::now();
        match self.provider.recognize(job.path()).await {
            Ok(result) => {
                tracing::debug!(
                    job_id = %job.id(),
                    provider = self.provider.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    orientation = ?result.orientation,
                    "OCR finished"
                );
                Ok(result.text)
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id(),
                    provider = self.provider.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "OCR failed: {}",
                    e
                );
                Err(e.into())
            }
        }
    }
}

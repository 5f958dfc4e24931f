//! OCR Providers
//!
//! Defines the provider trait and the OCR.space implementation.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use super::types::{OcrError, OcrResult, OcrSpaceResponse, TimeoutPhase};
use crate::config::OcrConfig;

/// OCR provider trait
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Recognize the text of the image stored at `image_path`
    async fn recognize(&self, image_path: &Path) -> Result<OcrResult, OcrError>;
}

/// OCR.space HTTP provider
pub struct OcrSpaceProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: String,
    engine: u8,
    detect_orientation: bool,
}

impl OcrSpaceProvider {
    /// Build the provider and its HTTP client.
    ///
    /// `connect_timeout` bounds the TCP/TLS handshake. `read_timeout` is the
    /// overall deadline of the request (connect, upload and response), so a
    /// timeout after the connection was established is reported as the read
    /// phase.
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| OcrError::ApiError(format!("Failed to build HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            tracing::warn!("OCR_API_KEY is not set; OCR.space will reject requests");
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            language: config.language.clone(),
            engine: config.engine,
            detect_orientation: config.detect_orientation,
        })
    }

    async fn build_form(&self, image_path: &Path) -> Result<Form, OcrError> {
        let data = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.jpg")
            .to_string();
        let mime = mime_guess::from_path(image_path).first_or_octet_stream();

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(mime.as_ref())
            .map_err(|e| OcrError::ApiError(format!("Invalid content type: {}", e)))?;

        Ok(Form::new()
            .part("file", part)
            .text("apikey", self.api_key.clone())
            .text("language", self.language.clone())
            .text("OCREngine", self.engine.to_string())
            .text("detectOrientation", self.detect_orientation.to_string()))
    }
}

#[async_trait]
impl OcrProviderTrait for OcrSpaceProvider {
    fn name(&self) -> &'static str {
        "ocr.space"
    }

    async fn recognize(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let form = self.build_form(image_path).await?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(OcrError::Overloaded);
        }
        // Gateway failures, not a verdict on the image
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "OCR service returned {}: {}",
                status,
                body.trim()
            )));
        }

        let body: OcrSpaceResponse = response.json().await.map_err(classify_transport_error)?;

        tracing::debug!(
            exit_code = ?body.ocr_exit_code,
            errored = body.is_errored_on_processing,
            "OCR.space response received"
        );

        body.into_result()
    }
}

/// Map a reqwest failure onto the OCR error taxonomy.
fn classify_transport_error(e: reqwest::Error) -> OcrError {
    if e.is_timeout() {
        let phase = if e.is_connect() {
            TimeoutPhase::Connect
        } else {
            TimeoutPhase::Read
        };
        return OcrError::Timeout(phase);
    }
    if e.is_decode() {
        return OcrError::ApiError(format!("Failed to decode OCR response: {}", e));
    }
    OcrError::ApiError(format!("Failed to call OCR service: {}", e))
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    outcome: Box<dyn Fn() -> Result<OcrResult, OcrError> + Send + Sync>,
    delay: Option<std::time::Duration>,
    calls: std::sync::atomic::AtomicUsize,
    staged: parking_lot::Mutex<Vec<(std::path::PathBuf, bool)>>,
}

#[cfg(test)]
impl MockProvider {
    /// Always recognizes `text`
    pub fn text(text: &str) -> Self {
        let text = text.to_string();
        Self::with_outcome(move || {
            Ok(OcrResult {
                text: text.clone(),
                orientation: None,
            })
        })
    }

    /// Always fails with the error built by `error`
    pub fn failing<F>(error: F) -> Self
    where
        F: Fn() -> OcrError + Send + Sync + 'static,
    {
        Self::with_outcome(move || Err(error()))
    }

    fn with_outcome<F>(outcome: F) -> Self
    where
        F: Fn() -> Result<OcrResult, OcrError> + Send + Sync + 'static,
    {
        Self {
            outcome: Box::new(outcome),
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            staged: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Paths handed to `recognize`, and whether each existed at call time
    pub fn staged(&self) -> Vec<(std::path::PathBuf, bool)> {
        self.staged.lock().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProviderTrait for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn recognize(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.staged
            .lock()
            .push((image_path.to_path_buf(), image_path.exists()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.outcome)()
    }
}

//! OCR Types
//!
//! Wire format of the OCR.space API and the errors a recognition can end in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which part of the downstream call ran out of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPhase {
    Connect,
    Read,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Read => f.write_str("read"),
        }
    }
}

/// OCR result
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    /// Raw recognized text, before normalization
    pub text: String,
    /// Orientation reported by the service, in degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}

/// Top-level OCR.space response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrSpaceResponse {
    #[serde(default)]
    pub parsed_results: Option<Vec<ParsedResult>>,
    #[serde(default)]
    pub is_errored_on_processing: bool,
    /// A string or a list of strings
    #[serde(default)]
    pub error_message: Option<Value>,
    #[serde(default)]
    pub error_details: Option<Value>,
    #[serde(rename = "OCRExitCode", default)]
    pub ocr_exit_code: Option<Value>,
}

/// Per-page result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParsedResult {
    #[serde(default)]
    pub parsed_text: Option<String>,
    #[serde(default)]
    pub text_orientation: Option<Value>,
    #[serde(default)]
    pub error_message: Option<Value>,
}

impl OcrSpaceResponse {
    /// Turn a decoded response into a result or a processing error.
    ///
    /// Missing or blank text is not an error at this level; the pipeline
    /// decides what an empty recognition means.
    pub fn into_result(self) -> Result<OcrResult, OcrError> {
        if self.is_errored_on_processing {
            let message = self
                .error_message
                .as_ref()
                .and_then(message_text)
                .or_else(|| self.error_details.as_ref().and_then(message_text))
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(OcrError::Processing(message));
        }

        let Some(results) = self.parsed_results else {
            return Err(OcrError::InvalidResponse(
                "response has no ParsedResults".to_string(),
            ));
        };

        let first = results.into_iter().next();
        Ok(OcrResult {
            text: first
                .as_ref()
                .and_then(|r| r.parsed_text.clone())
                .unwrap_or_default(),
            orientation: first
                .as_ref()
                .and_then(|r| r.text_orientation.as_ref())
                .and_then(message_text),
        })
    }
}

/// Flatten an OCR.space message field (string, number or list) into text.
fn message_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(message_text)
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR request timed out during {0}")]
    Timeout(TimeoutPhase),

    #[error("OCR service is overloaded")]
    Overloaded,

    #[error("OCR processing failed: {0}")]
    Processing(String),

    #[error("Invalid OCR response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Failed to read staged image: {0}")]
    Io(#[from] std::io::Error),
}

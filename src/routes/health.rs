//! Liveness endpoint

/// Plain-text liveness probe
pub async fn liveness() -> &'static str {
    "CCCD OCR API is running"
}

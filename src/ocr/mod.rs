//! OCR Module
//!
//! Client side of the external OCR collaborator.
//!
//! The pipeline only depends on [`OcrProviderTrait`]; the production
//! implementation is [`OcrSpaceProvider`], which uploads the staged image to
//! the OCR.space `parse/image` endpoint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cccd_ocr_server::ocr::{OcrProviderTrait, OcrSpaceProvider};
//!
//! let provider = OcrSpaceProvider::new(&config.ocr)?;
//! let result = provider.recognize(Path::new("/tmp/upload.jpg")).await?;
//! println!("{}", result.text);
//! ```

mod provider;
mod types;

pub use provider::{OcrProviderTrait, OcrSpaceProvider};
pub use types::{OcrError, OcrResult, OcrSpaceResponse, ParsedResult, TimeoutPhase};

#[cfg(test)]
pub use provider::MockProvider;

//! CCCD OCR Server Library
//!
//! Accepts photos of Vietnamese citizen identity cards, forwards them to an
//! external OCR service and returns the cleaned text together with a
//! downloadable spreadsheet.
//!
//! The main server binary is in main.rs.
//!
//! # Modules
//!
//! - `admission`: Sliding-window rate limiter and OCR slot limiter
//! - `pipeline`: Per-request flow from upload to export
//! - `ocr`: OCR collaborator client
//! - `normalize`: Data-driven cleanup of recognized text
//! - `export`: Spreadsheet artifacts and their expiry

pub mod admission;
pub mod config;
pub mod error;
pub mod export;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;
pub mod routes;
pub mod state;

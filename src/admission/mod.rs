//! Admission Control
//!
//! Gates access to the OCR backend before any expensive work is done.
//!
//! Two independent limiters answer two different questions:
//! - [`SlidingWindowLimiter`]: how often may the backend be called over time
//! - [`ConcurrencySlotLimiter`]: how many backend calls may run right now
//!
//! [`AdmissionController`] composes them into a single decision. When the
//! rate limiter admits but no slot is free, the rate record is rolled back so
//! the rejected request does not count against the window.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::time::{Duration, Instant};
//! use cccd_ocr_server::admission::{AdmissionController, AdmissionDecision};
//!
//! let controller = AdmissionController::with_limits(3, Duration::from_secs(20), 2);
//!
//! match controller.admit(Instant::now()) {
//!     AdmissionDecision::Admitted(permit) => {
//!         // call the backend; the slot is released when `permit` drops
//!     }
//!     AdmissionDecision::RateLimited => { /* 429, try later */ }
//!     AdmissionDecision::ConcurrencyLimited => { /* 429, not your turn */ }
//! }
//! ```

mod controller;
mod slots;
mod window;

pub use controller::{AdmissionController, AdmissionDecision};
pub use slots::{ConcurrencySlotLimiter, SlotPermit};
pub use window::SlidingWindowLimiter;

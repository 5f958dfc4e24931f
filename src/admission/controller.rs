//! Composition of the rate and concurrency limiters.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::slots::{ConcurrencySlotLimiter, SlotPermit};
use super::window::SlidingWindowLimiter;
use crate::config::AdmissionConfig;

/// Outcome of an admission attempt.
#[derive(Debug)]
pub enum AdmissionDecision {
    /// Both limiters admitted. The slot is held until the permit drops.
    Admitted(SlotPermit),
    /// Too many requests inside the rate window.
    RateLimited,
    /// Every backend slot is busy. The rate record was rolled back.
    ConcurrencyLimited,
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

/// Single admission decision over both limiters.
///
/// The two limiters keep separate locks and are never locked together: the
/// rollback re-locks the rate log only after the slot limiter has answered.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    rate: Arc<SlidingWindowLimiter>,
    slots: ConcurrencySlotLimiter,
}

impl AdmissionController {
    pub fn new(rate: SlidingWindowLimiter, slots: ConcurrencySlotLimiter) -> Self {
        Self {
            rate: Arc::new(rate),
            slots,
        }
    }

    /// Build from explicit limits.
    pub fn with_limits(request_limit: usize, window: Duration, max_slots: usize) -> Self {
        Self::new(
            SlidingWindowLimiter::new(request_limit, window),
            ConcurrencySlotLimiter::new(max_slots),
        )
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::with_limits(config.request_limit, config.window, config.max_slots)
    }

    /// Decide whether a request arriving at `now` may call the backend.
    pub fn admit(&self, now: Instant) -> AdmissionDecision {
        if !self.rate.try_record(now) {
            return AdmissionDecision::RateLimited;
        }

        match self.slots.try_acquire() {
            Some(permit) => AdmissionDecision::Admitted(permit),
            None => {
                // The request never ran, so it must not count against the window.
                self.rate.rollback(now);
                AdmissionDecision::ConcurrencyLimited
            }
        }
    }

    pub fn rate_limiter(&self) -> &SlidingWindowLimiter {
        &self.rate
    }

    pub fn slot_limiter(&self) -> &ConcurrencySlotLimiter {
        &self.slots
    }
}

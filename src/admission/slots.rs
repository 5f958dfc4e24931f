//! Bounded concurrency for backend calls.
//!
//! Acquire a slot before calling the OCR backend; the returned [`SlotPermit`]
//! gives the slot back when dropped. Acquisition never waits: when every slot
//! is held the caller is rejected immediately.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Non-blocking limiter over a fixed number of slots.
///
/// Cloning shares the same budget.
#[derive(Debug, Clone)]
pub struct ConcurrencySlotLimiter {
    budget: Arc<SlotBudget>,
}

#[derive(Debug)]
struct SlotBudget {
    capacity: usize,
    held: AtomicUsize,
}

/// Proof of a held slot. Releases it exactly once, on drop.
///
/// There is no other way to release a slot, so a release without a matching
/// acquisition cannot happen.
#[derive(Debug)]
#[must_use = "dropping the permit releases the slot immediately"]
pub struct SlotPermit {
    budget: Arc<SlotBudget>,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        self.budget.release();
    }
}

impl ConcurrencySlotLimiter {
    /// Create a limiter with `capacity` slots. Enforces a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            tracing::warn!("Concurrency limit of 0 would block every request, using 1 slot");
        }
        Self {
            budget: Arc::new(SlotBudget {
                capacity: capacity.max(1),
                held: AtomicUsize::new(0),
            }),
        }
    }

    /// Take a slot if one is free, or `None` if all are held.
    pub fn try_acquire(&self) -> Option<SlotPermit> {
        let budget = &self.budget;
        loop {
            let current = budget.held.load(Ordering::Acquire);
            if current >= budget.capacity {
                return None;
            }
            if budget
                .held
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(SlotPermit {
                    budget: Arc::clone(budget),
                });
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.budget.capacity
    }

    /// Slots currently held.
    pub fn held(&self) -> usize {
        self.budget.held.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub fn available(&self) -> usize {
        self.capacity().saturating_sub(self.held())
    }
}

impl SlotBudget {
    fn release(&self) {
        // Saturates at zero so a stray release can never create capacity.
        let _ = self
            .held
            .fetch_update(Ordering::Release, Ordering::Acquire, |held| held.checked_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_until_capacity() {
        let limiter = ConcurrencySlotLimiter::new(2);
        let _p1 = limiter.try_acquire().expect("slot 1");
        let _p2 = limiter.try_acquire().expect("slot 2");

        assert!(limiter.try_acquire().is_none());
        assert_eq!(limiter.held(), 2);
        assert_eq!(limiter.available(), 0);
    }

    #[test]
    fn test_drop_releases_slot() {
        let limiter = ConcurrencySlotLimiter::new(1);
        let permit = limiter.try_acquire().expect("slot");
        assert!(limiter.try_acquire().is_none());

        drop(permit);
        assert_eq!(limiter.held(), 0);
        assert!(limiter.try_acquire().is_some());
    }

    #[test]
    fn test_minimum_capacity_is_one() {
        let limiter = ConcurrencySlotLimiter::new(0);
        assert_eq!(limiter.capacity(), 1);
        let _p = limiter.try_acquire().expect("slot");
        assert!(limiter.try_acquire().is_none());
    }

    #[test]
    fn test_failed_acquire_leaves_budget_untouched() {
        let limiter = ConcurrencySlotLimiter::new(2);
        let p1 = limiter.try_acquire().expect("slot 1");
        let p2 = limiter.try_acquire().expect("slot 2");

        for _ in 0..5 {
            assert!(limiter.try_acquire().is_none());
        }
        drop(p1);
        drop(p2);

        assert_eq!(limiter.held(), 0);
        assert_eq!(limiter.available(), 2);
        let _a = limiter.try_acquire().expect("slot a");
        let _b = limiter.try_acquire().expect("slot b");
        assert!(limiter.try_acquire().is_none());
    }

    #[test]
    fn test_stray_release_never_exceeds_capacity() {
        let limiter = ConcurrencySlotLimiter::new(2);
        limiter.budget.release();
        limiter.budget.release();

        assert_eq!(limiter.held(), 0);
        assert_eq!(limiter.available(), 2);
        let _a = limiter.try_acquire().expect("slot a");
        let _b = limiter.try_acquire().expect("slot b");
        assert!(limiter.try_acquire().is_none());
    }

    #[test]
    fn test_clones_share_budget() {
        let limiter = ConcurrencySlotLimiter::new(1);
        let other = limiter.clone();
        let _p = limiter.try_acquire().expect("slot");
        assert!(other.try_acquire().is_none());
    }

    #[test]
    fn test_held_never_exceeds_capacity_under_contention() {
        let limiter = ConcurrencySlotLimiter::new(2);
        let observed_max = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = limiter.clone();
                let observed_max = Arc::clone(&observed_max);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut admitted = 0;
                    for _ in 0..200 {
                        if let Some(permit) = limiter.try_acquire() {
                            admitted += 1;
                            observed_max.fetch_max(limiter.held(), Ordering::AcqRel);
                            thread::sleep(Duration::from_micros(50));
                            drop(permit);
                        }
                    }
                    admitted
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert!(total > 0);
        assert!(observed_max.load(Ordering::Acquire) <= 2);
        assert_eq!(limiter.held(), 0);
    }
}

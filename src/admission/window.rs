//! Sliding-window request rate limiter.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Counts admitted requests inside a trailing time window.
///
/// The log is FIFO-ordered by arrival, so stale entries are always a prefix
/// and eviction is a front trim. Eviction, the count check and the append all
/// happen under one lock.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    log: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting at most `limit` requests per `window`.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            log: Mutex::new(VecDeque::new()),
        }
    }

    /// Record a request arriving at `now` if the window has room.
    ///
    /// Returns `false` without recording anything when `limit` requests are
    /// already inside the window ending at `now`.
    pub fn try_record(&self, now: Instant) -> bool {
        let mut log = self.log.lock();
        evict_stale(&mut log, now, self.window);

        if log.len() >= self.limit {
            return false;
        }

        log.push_back(now);
        true
    }

    /// Remove one entry recorded at `at`.
    ///
    /// Searches from the back since the entry to undo is almost always the
    /// most recent one. Returns `false` if no such entry is left (it may
    /// already have been evicted).
    pub fn rollback(&self, at: Instant) -> bool {
        let mut log = self.log.lock();
        match log.iter().rposition(|&t| t == at) {
            Some(index) => {
                log.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of entries currently held, without evicting.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Number of requests inside the window ending at `now`.
    #[cfg(test)]
    pub fn active(&self, now: Instant) -> usize {
        let mut log = self.log.lock();
        evict_stale(&mut log, now, self.window);
        log.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Drop every entry older than `now - window` from the front of the log.
fn evict_stale(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    let Some(cutoff) = now.checked_sub(window) else {
        return;
    };
    while log.front().is_some_and(|&t| t < cutoff) {
        log.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = SlidingWindowLimiter::new(3, secs(20));
        let t0 = Instant::now();

        assert!(limiter.try_record(t0));
        assert!(limiter.try_record(t0 + secs(1)));
        assert!(limiter.try_record(t0 + secs(2)));
        assert!(!limiter.try_record(t0 + secs(3)));
    }

    #[test]
    fn test_rejection_does_not_record() {
        let limiter = SlidingWindowLimiter::new(2, secs(20));
        let t0 = Instant::now();

        assert!(limiter.try_record(t0));
        assert!(limiter.try_record(t0));
        assert!(!limiter.try_record(t0 + secs(1)));
        assert!(!limiter.try_record(t0 + secs(2)));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn test_window_slides() {
        let limiter = SlidingWindowLimiter::new(3, secs(20));
        let t0 = Instant::now();

        for i in 0..3 {
            assert!(limiter.try_record(t0 + secs(i)));
        }
        assert!(!limiter.try_record(t0 + secs(10)));

        // t0 falls out of the window once now - 20s is past it
        assert!(limiter.try_record(t0 + secs(21)));
        assert_eq!(limiter.len(), 3);
        assert!(!limiter.try_record(t0 + secs(21)));
    }

    #[test]
    fn test_entry_at_window_edge_is_kept() {
        let limiter = SlidingWindowLimiter::new(1, secs(20));
        let t0 = Instant::now();

        assert!(limiter.try_record(t0));
        assert!(!limiter.try_record(t0 + secs(20)));
        assert!(limiter.try_record(t0 + secs(20) + Duration::from_millis(1)));
    }

    #[test]
    fn test_ten_per_minute_configuration() {
        let limiter = SlidingWindowLimiter::new(10, secs(60));
        let t0 = Instant::now();

        for i in 0..10 {
            assert!(limiter.try_record(t0 + secs(i * 5)));
        }
        assert!(!limiter.try_record(t0 + secs(59)));
        assert_eq!(limiter.active(t0 + secs(59)), 10);

        // t0 and t0+5s expire
        assert_eq!(limiter.active(t0 + secs(66)), 8);
        assert!(limiter.try_record(t0 + secs(66)));
    }

    #[test]
    fn test_rollback_removes_matching_entry() {
        let limiter = SlidingWindowLimiter::new(3, secs(20));
        let t0 = Instant::now();
        let t1 = t0 + secs(1);

        assert!(limiter.try_record(t0));
        assert!(limiter.try_record(t1));
        assert!(limiter.rollback(t1));

        assert_eq!(limiter.len(), 1);
        assert!(!limiter.rollback(t1));
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_rollback_of_evicted_entry_is_noop() {
        let limiter = SlidingWindowLimiter::new(3, secs(20));
        let t0 = Instant::now();

        assert!(limiter.try_record(t0));
        assert_eq!(limiter.active(t0 + secs(30)), 0);
        assert!(!limiter.rollback(t0));
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let limiter = SlidingWindowLimiter::new(0, secs(20));
        assert!(!limiter.try_record(Instant::now()));
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_no_window_exceeds_limit() {
        let limit = 3;
        let window = secs(20);
        let limiter = SlidingWindowLimiter::new(limit, window);
        let t0 = Instant::now();

        // Bursty arrivals over two minutes
        let offsets: Vec<u64> = vec![
            0, 0, 1, 2, 3, 5, 8, 13, 19, 20, 21, 21, 22, 30, 39, 40, 41, 41, 41, 60, 61, 79, 80,
            80, 81, 100, 100, 101, 119, 120,
        ];
        let admitted: Vec<u64> = offsets
            .iter()
            .copied()
            .filter(|&o| limiter.try_record(t0 + secs(o)))
            .collect();

        for &end in &offsets {
            let in_window = admitted
                .iter()
                .filter(|&&a| a <= end && a + window.as_secs() >= end)
                .count();
            assert!(
                in_window <= limit,
                "window ending at {}s holds {} admissions",
                end,
                in_window
            );
        }
    }
}

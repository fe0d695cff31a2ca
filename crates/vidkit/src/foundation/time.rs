//! Time management utilities

use std::time::{Duration, Instant};

/// Monotonic clock used to timestamp outgoing events
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start_time: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Start a new stopwatch
    pub fn new() -> Self {
        Self { start_time: Instant::now() }
    }

    /// Seconds elapsed since the stopwatch was started
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Time elapsed since the stopwatch was started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// A point in time after which some pending operation is considered overdue
///
/// Deadlines are checked opportunistically; nothing sleeps on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` after `now`
    pub fn after(now: Instant, timeout: Duration) -> Self {
        Self { at: now + timeout }
    }

    /// Check whether the deadline has passed at `now`
    pub fn expired(&self, now: Instant) -> bool {
        now >= self.at
    }

    /// Instant the deadline expires
    pub fn instant(&self) -> Instant {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_expiry() {
        let now = Instant::now();
        let deadline = Deadline::after(now, Duration::from_millis(500));
        assert!(!deadline.expired(now));
        assert!(!deadline.expired(now + Duration::from_millis(499)));
        assert!(deadline.expired(now + Duration::from_millis(500)));
    }
}

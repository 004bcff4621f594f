//! Global atomic counters for the infraction workflow.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters, safe to bump from any task.
pub struct Metrics {
    applied: AtomicU64,
    preconditions_failed: AtomicU64,
    duplicates_blocked: AtomicU64,
    record_failures: AtomicU64,
    action_failures: AtomicU64,
    pardons: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            applied: AtomicU64::new(0),
            preconditions_failed: AtomicU64::new(0),
            duplicates_blocked: AtomicU64::new(0),
            record_failures: AtomicU64::new(0),
            action_failures: AtomicU64::new(0),
            pardons: AtomicU64::new(0),
        }
    }

    pub fn inc_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_preconditions_failed(&self) {
        self.preconditions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_duplicates_blocked(&self) {
        self.duplicates_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_record_failures(&self) {
        self.record_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_action_failures(&self) {
        self.action_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_pardons(&self) {
        self.pardons.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            applied = self.applied(),
            preconditions_failed = self.preconditions_failed(),
            duplicates_blocked = self.duplicates_blocked(),
            record_failures = self.record_failures(),
            action_failures = self.action_failures(),
            pardons = self.pardons(),
        );
    }

    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn preconditions_failed(&self) -> u64 {
        self.preconditions_failed.load(Ordering::Relaxed)
    }

    pub fn duplicates_blocked(&self) -> u64 {
        self.duplicates_blocked.load(Ordering::Relaxed)
    }

    pub fn record_failures(&self) -> u64 {
        self.record_failures.load(Ordering::Relaxed)
    }

    pub fn action_failures(&self) -> u64 {
        self.action_failures.load(Ordering::Relaxed)
    }

    pub fn pardons(&self) -> u64 {
        self.pardons.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.applied.store(0, Ordering::Relaxed);
        self.preconditions_failed.store(0, Ordering::Relaxed);
        self.duplicates_blocked.store(0, Ordering::Relaxed);
        self.record_failures.store(0, Ordering::Relaxed);
        self.action_failures.store(0, Ordering::Relaxed);
        self.pardons.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.applied(), 0);
        m.inc_applied();
        m.inc_applied();
        assert_eq!(m.applied(), 2);

        m.inc_duplicates_blocked();
        m.inc_record_failures();
        m.inc_action_failures();
        m.inc_pardons();
        m.inc_preconditions_failed();
        assert_eq!(m.duplicates_blocked(), 1);
        assert_eq!(m.record_failures(), 1);
        assert_eq!(m.action_failures(), 1);
        assert_eq!(m.pardons(), 1);
        assert_eq!(m.preconditions_failed(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_applied();
        m.inc_pardons();
        m.reset();
        assert_eq!(m.applied(), 0);
        assert_eq!(m.pardons(), 0);
    }
}

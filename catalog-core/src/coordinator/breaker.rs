use std::sync::atomic::{AtomicU32, Ordering};

/// Consecutive-failure breaker
///
/// Counts fetch failures in a row. Once the count reaches the threshold the
/// breaker is tripped and stays tripped until a success or an explicit reset.
#[derive(Debug)]
pub struct FailureBreaker {
    failures: AtomicU32,
    threshold: u32,
}

impl FailureBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            failures: AtomicU32::new(0),
            threshold: threshold.max(1),
        }
    }

    /// Record a failure, returning the new consecutive count
    pub fn record_failure(&self) -> u32 {
        self.failures.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_success(&self) {
        self.failures.store(0, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.failures.store(0, Ordering::SeqCst);
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_tripped(&self) -> bool {
        self.failures() >= self.threshold
    }
}

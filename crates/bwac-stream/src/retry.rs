//! Reconnect backoff state.
//!
//! Backoff grows linearly with the number of consecutive failed sessions
//! (`step × failures`) and has no upper bound. Any session that ends by
//! expiring resets it.

use std::time::Duration;

use tracing::debug;

/// Consecutive-failure tracking for the reconnect loop.
#[derive(Debug, Clone)]
pub struct RetryState {
    consecutive_failures: u32,
    current_backoff: Duration,
    step: Duration,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl RetryState {
    pub fn new(step: Duration) -> Self {
        Self {
            consecutive_failures: 0,
            current_backoff: Duration::ZERO,
            step,
        }
    }

    /// Record a failed session and return how long to wait before the next one.
    pub fn record_failure(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.current_backoff = self.step.saturating_mul(self.consecutive_failures);
        self.current_backoff
    }

    /// Record a successful session (resets failure count).
    pub fn reset(&mut self) {
        if self.consecutive_failures > 0 {
            debug!(
                "Recovered after {} consecutive failures",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
        self.current_backoff = Duration::ZERO;
    }

    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn current_backoff(&self) -> Duration {
        self.current_backoff
    }
}

//! Throttled progress logging for a live session.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

/// Minimum time between two progress lines when records arrive slowly.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Counts records in a session and logs every `every` records, or at most
/// once per [`PROGRESS_INTERVAL`] when fewer arrive.
#[derive(Debug)]
pub struct ProgressReporter {
    every: u64,
    processed: u64,
    started: Instant,
    last_report: Instant,
    budget: Duration,
    current_day: Option<String>,
}

impl ProgressReporter {
    pub fn new(every: u64, started: Instant, budget: Duration) -> Self {
        Self {
            every,
            processed: 0,
            started,
            last_report: started,
            budget,
            current_day: None,
        }
    }

    /// Count one written record for `day`.
    pub fn record(&mut self, day: &str) {
        self.processed += 1;

        if self.current_day.as_deref() != Some(day) {
            debug!(day, previous = ?self.current_day, "Day bucket changed");
            self.current_day = Some(day.to_string());
        }

        let by_count = self.every > 0 && self.processed % self.every == 0;
        let by_time = self.last_report.elapsed() >= PROGRESS_INTERVAL;
        if by_count || by_time {
            self.report();
        }
    }

    fn report(&mut self) {
        let age = self.started.elapsed();
        info!(
            processed = self.processed,
            day = self.current_day.as_deref().unwrap_or("-"),
            session_age_secs = age.as_secs(),
            renewal_in_secs = self.budget.saturating_sub(age).as_secs(),
            "Processed {} messages",
            self.processed
        );
        self.last_report = Instant::now();
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn current_day(&self) -> Option<&str> {
        self.current_day.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

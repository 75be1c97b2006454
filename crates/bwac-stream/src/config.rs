//! Ingestion configuration.

use std::time::Duration;

/// Default live feed endpoint.
pub const DEFAULT_LIVE_URL: &str = "https://live.ais.barentswatch.no/v1/combined";

/// Default historic API base.
pub const DEFAULT_HISTORIC_URL: &str = "https://historic.ais.barentswatch.no/v1/historic";

/// Stream and historic client configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Live feed URL (newline-delimited JSON)
    pub live_url: String,
    /// Historic API base URL
    pub historic_url: String,
    /// Connect timeout for every request
    pub connect_timeout: Duration,
    /// Total timeout for non-streaming (historic) requests
    pub request_timeout: Duration,
    /// Session budget when the token reports no remaining lifetime
    pub default_session: Duration,
    /// Backoff added per consecutive failure
    pub backoff_step: Duration,
    /// Log progress every N records (0 disables)
    pub progress_every: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            live_url: DEFAULT_LIVE_URL.to_string(),
            historic_url: DEFAULT_HISTORIC_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            default_session: Duration::from_secs(3500),
            backoff_step: Duration::from_secs(5),
            progress_every: 1000,
        }
    }
}

impl StreamConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            live_url: std::env::var("BARENTS_WATCH_LIVE_URL")
                .unwrap_or_else(|_| DEFAULT_LIVE_URL.to_string()),
            historic_url: std::env::var("BARENTS_WATCH_HISTORIC_URL")
                .unwrap_or_else(|_| DEFAULT_HISTORIC_URL.to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("BWAC_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("BWAC_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            default_session: Duration::from_secs(
                std::env::var("BWAC_DEFAULT_SESSION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3500),
            ),
            backoff_step: Duration::from_secs(
                std::env::var("BWAC_BACKOFF_STEP_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            progress_every: std::env::var("BWAC_PROGRESS_EVERY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        }
    }
}

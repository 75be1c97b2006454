//! Reconnect loop for the live feed.
//!
//! Each iteration renews the token when needed, runs one session with the
//! token's remaining lifetime as budget and decides what happens next:
//! an expired session reconnects immediately, an auth or protocol failure
//! waits `step × consecutive_failures`, a file system failure stops the loop.
//! The day bucket store outlives sessions and is closed when the loop ends.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bwac_auth::{AccessTokenManager, AuthResult};
use bwac_storage::DayBucketFileStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::StreamConfig;
use crate::error::IngestResult;
use crate::ingestor::{SessionOutcome, StreamIngestor};
use crate::metrics;
use crate::retry::RetryState;

/// Source of bearer tokens for live sessions.
#[async_trait]
pub trait TokenSource: Send {
    /// Renew the token if needed (or always, with `force`).
    async fn acquire(&mut self, force: bool) -> AuthResult<()>;

    fn access_token(&self) -> AuthResult<&str>;

    /// Remaining token lifetime in seconds.
    fn expires_in(&self) -> AuthResult<i64>;
}

#[async_trait]
impl TokenSource for AccessTokenManager {
    async fn acquire(&mut self, force: bool) -> AuthResult<()> {
        AccessTokenManager::acquire(self, force).await
    }

    fn access_token(&self) -> AuthResult<&str> {
        AccessTokenManager::access_token(self)
    }

    fn expires_in(&self) -> AuthResult<i64> {
        AccessTokenManager::expires_in(self)
    }
}

/// Runs one live session.
#[async_trait]
pub trait SessionRunner: Send {
    async fn run_session(
        &mut self,
        token: &str,
        max_duration: Duration,
        store: &mut DayBucketFileStore,
        shutdown: &CancellationToken,
    ) -> IngestResult<SessionOutcome>;
}

#[async_trait]
impl SessionRunner for StreamIngestor {
    async fn run_session(
        &mut self,
        token: &str,
        max_duration: Duration,
        store: &mut DayBucketFileStore,
        shutdown: &CancellationToken,
    ) -> IngestResult<SessionOutcome> {
        self.run(token, max_duration, store, shutdown).await
    }
}

/// Owns the token source, the session runner and the retry state.
pub struct ReconnectSupervisor<T, R> {
    tokens: T,
    runner: R,
    retry: RetryState,
    default_session: Duration,
    shutdown: CancellationToken,
}

impl<T: TokenSource, R: SessionRunner> ReconnectSupervisor<T, R> {
    pub fn new(tokens: T, runner: R, config: &StreamConfig, shutdown: CancellationToken) -> Self {
        Self {
            tokens,
            runner,
            retry: RetryState::new(config.backoff_step),
            default_session: config.default_session,
            shutdown,
        }
    }

    pub fn retry_state(&self) -> &RetryState {
        &self.retry
    }

    /// Ingest into `output_root` until shutdown or a fatal error.
    ///
    /// Open day files are flushed and closed on every exit path.
    pub async fn run_forever(&mut self, output_root: &Path) -> IngestResult<()> {
        let mut store = DayBucketFileStore::open(output_root).await?;
        info!(output_dir = %store.root().display(), "Starting live ingestion");

        let result = self.supervise(&mut store).await;
        let closed = store.close_all().await;

        result?;
        closed?;
        info!("Live ingestion stopped, day files closed");
        Ok(())
    }

    /// The reconnect loop over an already open store.
    pub async fn supervise(&mut self, store: &mut DayBucketFileStore) -> IngestResult<()> {
        loop {
            if self.shutdown.is_cancelled() {
                return Ok(());
            }

            let result = self.run_session(store).await;
            store.flush_all().await?;

            match result {
                Ok(SessionOutcome::SessionExpired { records, elapsed }) => {
                    metrics::record_session("expired");
                    self.retry.reset();
                    info!(
                        records,
                        elapsed_secs = elapsed.as_secs(),
                        "Session expired, reconnecting with renewed token"
                    );
                }
                Ok(SessionOutcome::Shutdown { records }) => {
                    metrics::record_session("shutdown");
                    info!(records, "Session stopped by shutdown");
                    return Ok(());
                }
                Err(e) if e.is_fatal() => {
                    metrics::record_session("fatal");
                    error!(error = %e, "Unrecoverable ingestion error");
                    return Err(e);
                }
                Err(e) => {
                    metrics::record_session(e.category());
                    let delay = self.retry.record_failure();
                    warn!(
                        error = %e,
                        kind = e.category(),
                        failures = self.retry.failure_count(),
                        backoff_secs = delay.as_secs(),
                        "Session failed, reconnecting after backoff"
                    );

                    tokio::select! {
                        _ = self.shutdown.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    async fn run_session(&mut self, store: &mut DayBucketFileStore) -> IngestResult<SessionOutcome> {
        if let Err(e) = self.tokens.acquire(false).await {
            metrics::record_token_request("error");
            return Err(e.into());
        }
        metrics::record_token_request("ok");

        let budget = match self.tokens.expires_in()? {
            secs if secs > 0 => Duration::from_secs(secs as u64),
            _ => self.default_session,
        };
        let token = self.tokens.access_token()?.to_owned();

        self.runner
            .run_session(&token, budget, store, &self.shutdown)
            .await
    }
}

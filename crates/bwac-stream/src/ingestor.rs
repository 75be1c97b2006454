//! Live feed session.
//!
//! One [`StreamIngestor::run`] call is one HTTP connection: the body is read
//! line by line, each line is decoded into a [`PositionReport`] and appended
//! to the day bucket of its UTC `msgtime`. The session ends when its time
//! budget is spent, on shutdown, or with an error. A clean end of stream is
//! treated as an error since the feed is expected to be endless.

use std::time::Duration;

use bwac_models::{day_key, PositionReport};
use bwac_storage::{BucketWrite, DayBucketFileStore};
use chrono::Utc;
use futures::TryStreamExt;
use reqwest::Client;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time::{sleep_until, Instant};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::config::StreamConfig;
use crate::error::{IngestError, IngestResult};
use crate::metrics;
use crate::progress::ProgressReporter;

/// Longest accepted feed line in bytes, newline included.
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

/// How a session ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The time budget was spent; reconnect right away with a fresh token.
    SessionExpired { records: u64, elapsed: Duration },
    /// Shutdown was requested.
    Shutdown { records: u64 },
}

impl SessionOutcome {
    pub fn records(&self) -> u64 {
        match self {
            SessionOutcome::SessionExpired { records, .. } | SessionOutcome::Shutdown { records } => {
                *records
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionOutcome::SessionExpired { .. } => "expired",
            SessionOutcome::Shutdown { .. } => "shutdown",
        }
    }
}

/// Consumes the live feed into a [`DayBucketFileStore`].
#[derive(Debug, Clone)]
pub struct StreamIngestor {
    http: Client,
    live_url: String,
    progress_every: u64,
}

impl StreamIngestor {
    pub fn new(config: &StreamConfig) -> IngestResult<Self> {
        // No total timeout: the body is read for the whole session.
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("bwac/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            live_url: config.live_url.clone(),
            progress_every: config.progress_every,
        })
    }

    /// Run one session with `token`, ending after at most `max_duration`.
    pub async fn run(
        &self,
        token: &str,
        max_duration: Duration,
        store: &mut DayBucketFileStore,
        shutdown: &CancellationToken,
    ) -> IngestResult<SessionOutcome> {
        let started = Instant::now();
        let span = info_span!("live_session", budget_secs = max_duration.as_secs());

        async move {
            let request = self.http.get(&self.live_url).bearer_auth(token).send();
            let response = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    return Ok(SessionOutcome::Shutdown { records: 0 });
                }
                _ = sleep_until(started + max_duration) => {
                    return Ok(SessionOutcome::SessionExpired {
                        records: 0,
                        elapsed: started.elapsed(),
                    });
                }
                response = request => response?,
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(IngestError::HttpStatus {
                    url: self.live_url.clone(),
                    status: status.as_u16(),
                    body,
                });
            }

            info!(url = %self.live_url, "Connected to live feed");

            let body = response.bytes_stream().map_err(std::io::Error::other);
            let reader = StreamReader::new(Box::pin(body));
            self.consume(reader, started, max_duration, store, shutdown)
                .await
        }
        .instrument(span)
        .await
    }

    /// Drive lines from `reader` into `store` until the budget counted from
    /// `started` is spent, shutdown is requested, or a line fails.
    pub async fn consume<R>(
        &self,
        mut reader: R,
        started: Instant,
        max_duration: Duration,
        store: &mut DayBucketFileStore,
        shutdown: &CancellationToken,
    ) -> IngestResult<SessionOutcome>
    where
        R: AsyncBufRead + Unpin,
    {
        let expiry = sleep_until(started + max_duration);
        tokio::pin!(expiry);

        let mut buf = Vec::new();
        let mut progress = ProgressReporter::new(self.progress_every, started, max_duration);

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(records = progress.processed(), "Shutdown requested, closing live feed");
                    return Ok(SessionOutcome::Shutdown { records: progress.processed() });
                }
                _ = &mut expiry => return Ok(expired(&progress)),
                line = read_line(&mut reader, &mut buf) => line,
            };

            let Some(line) = next? else {
                return Err(IngestError::protocol(format!(
                    "live feed closed the stream after {} records",
                    progress.processed()
                )));
            };

            if line.trim().is_empty() {
                continue;
            }

            let day = ingest_line(&line, store).await?;
            progress.record(&day);

            if started.elapsed() >= max_duration {
                return Ok(expired(&progress));
            }
        }
    }
}

/// Read one newline-terminated line of at most [`MAX_LINE_BYTES`].
///
/// Returns `None` at end of stream. The trailing `\n` or `\r\n` is stripped.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> IngestResult<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES)
        .read_until(b'\n', buf)
        .await
        .map_err(|e| IngestError::protocol(format!("failed to read live feed: {}", e)))?;

    if read == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if read as u64 >= MAX_LINE_BYTES {
        return Err(IngestError::protocol(format!(
            "live feed line exceeds {} bytes",
            MAX_LINE_BYTES
        )));
    }

    String::from_utf8(std::mem::take(buf))
        .map(Some)
        .map_err(|e| IngestError::protocol(format!("live feed line is not UTF-8: {}", e)))
}

fn expired(progress: &ProgressReporter) -> SessionOutcome {
    SessionOutcome::SessionExpired {
        records: progress.processed(),
        elapsed: progress.elapsed(),
    }
}

/// Decode one line and append it; returns the day key it was filed under.
async fn ingest_line(line: &str, store: &mut DayBucketFileStore) -> IngestResult<String> {
    let record = PositionReport::from_json_line(line)?;
    let ts = record.timestamp()?;
    let day = day_key(&ts);

    let outcome = store.write(&day, ts.with_timezone(&Utc), &record).await?;
    metrics::record_written("live", 1);

    if let BucketWrite::Rotated { evicted } = outcome {
        metrics::record_bucket_eviction();
        debug!(day = %day, evicted = %evicted, "Rotated day bucket");
    }

    Ok(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bwac_models::parse_msgtime;
    use chrono::Timelike;
    use tokio::io::{AsyncWriteExt, BufReader};

    const FIRST: &str = r#"{"msgtime":"2025-07-24T10:14:50+00:00","mmsi":1}"#;
    const SECOND: &str = r#"{"msgtime":"2025-07-24T10:14:51.1234567+00:00","mmsi":1}"#;

    fn ingestor() -> StreamIngestor {
        StreamIngestor::new(&StreamConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_expires_after_budget() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DayBucketFileStore::open(dir.path()).await.unwrap();
        let (mut feed, server) = tokio::io::duplex(4096);
        feed.write_all(format!("{FIRST}\n{SECOND}\n").as_bytes())
            .await
            .unwrap();

        let outcome = ingestor()
            .consume(
                BufReader::new(server),
                Instant::now(),
                Duration::from_secs(5),
                &mut store,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        match outcome {
            SessionOutcome::SessionExpired { records, elapsed } => {
                assert_eq!(records, 2);
                assert!(elapsed >= Duration::from_secs(5));
            }
            other => panic!("expected expiry, got {:?}", other),
        }

        store.close_all().await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("AIS_2025_07_24.csv")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "msgtime,mmsi");
        assert_eq!(lines.len(), 3);

        let second = lines[2].split(',').next().unwrap();
        assert_eq!(parse_msgtime(second).unwrap().nanosecond() / 1000, 123_456);
        drop(feed);
    }

    #[tokio::test]
    async fn test_end_of_stream_is_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DayBucketFileStore::open(dir.path()).await.unwrap();
        let body = format!("{FIRST}\n\n{SECOND}\n");

        let err = ingestor()
            .consume(
                body.as_bytes(),
                Instant::now(),
                Duration::from_secs(3500),
                &mut store,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Protocol(_)));
        assert!(err.is_retryable());
        store.close_all().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("AIS_2025_07_24.csv")).unwrap();
        assert_eq!(written.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_malformed_line_ends_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DayBucketFileStore::open(dir.path()).await.unwrap();
        let body = format!("{FIRST}\n{{\"msgtime\": \n{SECOND}\n");

        let err = ingestor()
            .consume(
                body.as_bytes(),
                Instant::now(),
                Duration::from_secs(3500),
                &mut store,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Record(_)));
        assert_eq!(err.category(), "protocol");
        store.close_all().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("AIS_2025_07_24.csv")).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_line_is_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DayBucketFileStore::open(dir.path()).await.unwrap();
        let mut body = format!("{FIRST}\n").into_bytes();
        body.extend(std::iter::repeat(b'x').take(MAX_LINE_BYTES as usize + 10));

        let err = ingestor()
            .consume(
                &body[..],
                Instant::now(),
                Duration::from_secs(3500),
                &mut store,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            IngestError::Protocol(msg) => assert!(msg.contains("exceeds"), "{}", msg),
            other => panic!("expected protocol error, got {:?}", other),
        }
        store.close_all().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("AIS_2025_07_24.csv")).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_crlf_and_unterminated_last_line_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DayBucketFileStore::open(dir.path()).await.unwrap();
        let body = format!("{FIRST}\r\n{SECOND}");

        let err = ingestor()
            .consume(
                body.as_bytes(),
                Instant::now(),
                Duration::from_secs(3500),
                &mut store,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Protocol(_)));
        store.close_all().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("AIS_2025_07_24.csv")).unwrap();
        assert_eq!(written.lines().count(), 3);
        assert!(!written.contains('\r'));
    }

    #[tokio::test]
    async fn test_unparsable_msgtime_is_record_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DayBucketFileStore::open(dir.path()).await.unwrap();

        let err = ingestor()
            .consume(
                &b"{\"msgtime\":\"yesterday\",\"mmsi\":1}\n"[..],
                Instant::now(),
                Duration::from_secs(3500),
                &mut store,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Record(_)));
        assert_eq!(store.open_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wins_over_pending_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DayBucketFileStore::open(dir.path()).await.unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let outcome = ingestor()
            .consume(
                format!("{FIRST}\n").as_bytes(),
                Instant::now(),
                Duration::from_secs(5),
                &mut store,
                &shutdown,
            )
            .await
            .unwrap();

        assert_eq!(outcome, SessionOutcome::Shutdown { records: 0 });
        assert_eq!(outcome.label(), "shutdown");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_expires_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DayBucketFileStore::open(dir.path()).await.unwrap();

        let outcome = ingestor()
            .consume(
                format!("{FIRST}\n").as_bytes(),
                Instant::now(),
                Duration::ZERO,
                &mut store,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(outcome.records() <= 1);
        assert_eq!(outcome.label(), "expired");
    }
}

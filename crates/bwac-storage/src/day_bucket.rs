//! Day-bucketed live output.
//!
//! The live feed is written to one file per UTC day. Handles are kept open
//! between writes; at most [`MAX_OPEN_BUCKETS`] days are open at once so
//! that late reports for the previous day can still be appended after
//! midnight. A day is closed once a report arrives that is more than
//! [`EVICTION_TOLERANCE_SECS`] past the latest report written to it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bwac_models::PositionReport;
use chrono::{DateTime, Duration, Utc};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::csv::{header_line, value_line};
use crate::error::{StorageError, StorageResult};
use crate::layout::{ensure_output_dir, live_file_name, needs_header};

/// Maximum number of day files held open concurrently.
pub const MAX_OPEN_BUCKETS: usize = 2;

/// Late-delivery tolerance across a day boundary (2 hours).
pub const EVICTION_TOLERANCE_SECS: i64 = 7200;

/// How a write was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketWrite {
    /// Appended to an already open bucket.
    Appended,
    /// Opened a new bucket without closing another.
    Opened,
    /// Closed the oldest bucket and opened a new one.
    Rotated { evicted: String },
    /// Both slots are taken by days that may still receive late reports;
    /// the line was appended through a short-lived handle instead.
    Detached,
}

/// One open day file.
struct DayBucket {
    path: PathBuf,
    writer: BufWriter<File>,
    header_written: bool,
    latest: DateTime<Utc>,
    records: u64,
}

impl DayBucket {
    async fn open(path: PathBuf, first_seen: DateTime<Utc>) -> StorageResult<Self> {
        let fresh = needs_header(&path).await?;
        let file = open_append(&path).await?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            header_written: !fresh,
            latest: first_seen,
            records: 0,
        })
    }

    async fn append(&mut self, record: &PositionReport, at: DateTime<Utc>) -> StorageResult<()> {
        let mut buf = String::new();
        if !self.header_written {
            buf.push_str(&header_line(record));
            buf.push('\n');
        }
        buf.push_str(&value_line(record));
        buf.push('\n');

        self.writer
            .write_all(buf.as_bytes())
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;

        self.header_written = true;
        self.records += 1;
        if at > self.latest {
            self.latest = at;
        }
        Ok(())
    }

    async fn flush(&mut self) -> StorageResult<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| StorageError::io(&self.path, e))
    }

    async fn close(mut self) -> StorageResult<()> {
        self.flush().await?;
        self.writer
            .shutdown()
            .await
            .map_err(|e| StorageError::io(&self.path, e))
    }
}

/// Bounded set of open, append-only day files keyed by `YYYY_MM_DD`.
///
/// `BTreeMap` ordering on zero-padded day keys is chronological, so the
/// first entry is always the oldest open day.
pub struct DayBucketFileStore {
    root: PathBuf,
    max_open: usize,
    tolerance: Duration,
    buckets: BTreeMap<String, DayBucket>,
}

impl DayBucketFileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = ensure_output_dir(root.as_ref()).await?;
        Ok(Self {
            root,
            max_open: MAX_OPEN_BUCKETS,
            tolerance: Duration::seconds(EVICTION_TOLERANCE_SECS),
            buckets: BTreeMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file for `day_key`.
    pub fn path_for(&self, day_key: &str) -> PathBuf {
        self.root.join(live_file_name(day_key))
    }

    /// Append `record`, observed at `at`, to the bucket for `day_key`.
    pub async fn write(
        &mut self,
        day_key: &str,
        at: DateTime<Utc>,
        record: &PositionReport,
    ) -> StorageResult<BucketWrite> {
        if let Some(bucket) = self.buckets.get_mut(day_key) {
            bucket.append(record, at).await?;
            return Ok(BucketWrite::Appended);
        }

        let mut evicted = None;
        if self.buckets.len() >= self.max_open {
            match self.oldest_evictable(at) {
                Some(day) => {
                    self.evict(&day).await?;
                    evicted = Some(day);
                }
                None => {
                    self.append_detached(day_key, record).await?;
                    return Ok(BucketWrite::Detached);
                }
            }
        }

        let path = self.path_for(day_key);
        let mut bucket = DayBucket::open(path, at).await?;
        bucket.append(record, at).await?;
        info!(
            day = %day_key,
            path = %bucket.path.display(),
            "Opened day bucket"
        );
        self.buckets.insert(day_key.to_string(), bucket);

        Ok(match evicted {
            Some(evicted) => BucketWrite::Rotated { evicted },
            None => BucketWrite::Opened,
        })
    }

    /// The oldest open day, if `at` is past its tolerance window.
    fn oldest_evictable(&self, at: DateTime<Utc>) -> Option<String> {
        let (day, bucket) = self.buckets.first_key_value()?;
        (at - bucket.latest > self.tolerance).then(|| day.clone())
    }

    async fn evict(&mut self, day_key: &str) -> StorageResult<()> {
        if let Some(bucket) = self.buckets.remove(day_key) {
            let records = bucket.records;
            bucket.close().await?;
            info!(day = %day_key, records, "Closed day bucket");
        }
        Ok(())
    }

    async fn append_detached(&self, day_key: &str, record: &PositionReport) -> StorageResult<()> {
        let path = self.path_for(day_key);
        let mut buf = String::new();
        if needs_header(&path).await? {
            buf.push_str(&header_line(record));
            buf.push('\n');
        }
        buf.push_str(&value_line(record));
        buf.push('\n');

        let mut file = open_append(&path).await?;
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        file.flush().await.map_err(|e| StorageError::io(&path, e))?;

        debug!(day = %day_key, "Appended report outside open buckets");
        Ok(())
    }

    /// Days currently open, oldest first.
    pub fn open_days(&self) -> Vec<&str> {
        self.buckets.keys().map(String::as_str).collect()
    }

    pub fn open_count(&self) -> usize {
        self.buckets.len()
    }

    /// Latest report time written to an open bucket.
    pub fn latest_seen(&self, day_key: &str) -> Option<DateTime<Utc>> {
        self.buckets.get(day_key).map(|b| b.latest)
    }

    /// Flush every open bucket without closing it.
    pub async fn flush_all(&mut self) -> StorageResult<()> {
        for bucket in self.buckets.values_mut() {
            bucket.flush().await?;
        }
        Ok(())
    }

    /// Flush and close every open bucket.
    ///
    /// All buckets are closed even if one fails; the first error is returned.
    pub async fn close_all(&mut self) -> StorageResult<()> {
        let mut first_error = None;
        while let Some((day, bucket)) = self.buckets.pop_first() {
            let records = bucket.records;
            match bucket.close().await {
                Ok(()) => debug!(day = %day, records, "Closed day bucket"),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn open_append(path: &Path) -> StorageResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StorageError::io(path, e))
}

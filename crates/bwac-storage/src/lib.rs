//! CSV persistence for AIS position reports.
//!
//! This crate provides:
//! - [`DayBucketFileStore`] for the live feed: at most two day files kept
//!   open, header written once per file, oldest day evicted on rotation
//! - [`TrackWriter`] for historic per-vessel tracks
//! - Plain CSV line rendering shared by both

pub mod csv;
pub mod day_bucket;
pub mod error;
pub mod layout;
pub mod track;

pub use day_bucket::{BucketWrite, DayBucketFileStore, EVICTION_TOLERANCE_SECS, MAX_OPEN_BUCKETS};
pub use error::{StorageError, StorageResult};
pub use track::TrackWriter;

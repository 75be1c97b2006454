//! Shared data models for the bwac AIS client.
//!
//! This crate provides:
//! - [`PositionReport`], an insertion-ordered AIS record decoded from JSON
//! - Provider timestamp normalization and UTC day keys
//! - Query-window helpers for the historic interface

pub mod error;
pub mod record;
pub mod timestamp;

pub use error::{ModelError, ModelResult};
pub use record::PositionReport;
pub use timestamp::{day_intervals, day_key, format_query_time, parse_msgtime};

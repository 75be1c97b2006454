//! BarentsWatch AIS ingestion.
//!
//! This crate provides:
//! - [`StreamIngestor`], one live feed session written to day files
//! - [`ReconnectSupervisor`], the token-renewing reconnect loop with linear backoff
//! - [`HistoricClient`], the per-day historic track download
//! - Shutdown signal handling and tracing setup for the `bwac` binary

pub mod areas;
pub mod config;
pub mod error;
pub mod historic;
pub mod ingestor;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod retry;
pub mod signal;
pub mod supervisor;

pub use config::StreamConfig;
pub use error::{IngestError, IngestResult};
pub use historic::{DownloadSummary, HistoricClient};
pub use ingestor::{SessionOutcome, StreamIngestor};
pub use retry::RetryState;
pub use supervisor::{ReconnectSupervisor, SessionRunner, TokenSource};

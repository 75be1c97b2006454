//! Historic per-vessel track output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bwac_models::{day_key, PositionReport};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::csv::{header_line, value_line};
use crate::error::{StorageError, StorageResult};
use crate::layout::{ensure_output_dir, needs_header, track_file_name};

/// Writes historic tracks to `AIS_<day>_<mmsi>.csv` files.
#[derive(Debug, Clone)]
pub struct TrackWriter {
    root: PathBuf,
}

impl TrackWriter {
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = ensure_output_dir(root.as_ref()).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one track and return the number of reports written.
    ///
    /// The provider returns tracks newest first; reports are written in
    /// reverse so each file reads oldest to newest. Each target file is
    /// opened once per call and closed before returning.
    pub async fn save_track(&self, track: &[PositionReport]) -> StorageResult<usize> {
        let mut files: BTreeMap<PathBuf, Vec<&PositionReport>> = BTreeMap::new();

        for record in track.iter().rev() {
            let ts = record.timestamp()?;
            let mmsi = record.mmsi()?;
            let path = self.root.join(track_file_name(&day_key(&ts), &mmsi));
            files.entry(path).or_default().push(record);
        }

        let mut written = 0;
        for (path, records) in files {
            written += append_all(&path, &records).await?;
        }
        Ok(written)
    }
}

async fn append_all(path: &Path, records: &[&PositionReport]) -> StorageResult<usize> {
    let Some(first) = records.first() else {
        return Ok(0);
    };

    let mut buf = String::new();
    if needs_header(path).await? {
        buf.push_str(&header_line(first));
        buf.push('\n');
    }
    for record in records {
        buf.push_str(&value_line(record));
        buf.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.write_all(buf.as_bytes())
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.flush().await.map_err(|e| StorageError::io(path, e))?;

    debug!(path = %path.display(), records = records.len(), "Wrote track file");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Vec<PositionReport> {
        serde_json::from_str(
            r#"[
                {"mmsi":257000001,"msgtime":"2025-07-25T00:10:00+00:00","speedOverGround":1.5},
                {"mmsi":257000001,"msgtime":"2025-07-24T23:50:00+00:00","speedOverGround":1.2},
                {"mmsi":257000001,"msgtime":"2025-07-24T23:40:00.1234567+00:00","speedOverGround":1.1}
            ]"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_track_splits_by_day_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TrackWriter::new(dir.path().join("historic")).await.unwrap();

        let written = writer.save_track(&track()).await.unwrap();
        assert_eq!(written, 3);

        let day1 = std::fs::read_to_string(
            dir.path().join("historic").join("AIS_2025_07_24_257000001.csv"),
        )
        .unwrap();
        assert_eq!(
            day1,
            "mmsi,msgtime,speedOverGround\n\
             257000001,2025-07-24T23:40:00.1234567+00:00,1.1\n\
             257000001,2025-07-24T23:50:00+00:00,1.2\n"
        );

        let day2 = std::fs::read_to_string(
            dir.path().join("historic").join("AIS_2025_07_25_257000001.csv"),
        )
        .unwrap();
        assert_eq!(day2.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_save_track_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TrackWriter::new(dir.path()).await.unwrap();

        writer.save_track(&track()).await.unwrap();
        writer.save_track(&track()).await.unwrap();

        let day1 =
            std::fs::read_to_string(dir.path().join("AIS_2025_07_24_257000001.csv")).unwrap();
        assert_eq!(day1.lines().count(), 5);
        assert_eq!(day1.matches("mmsi,msgtime").count(), 1);
    }

    #[tokio::test]
    async fn test_save_track_requires_mmsi() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TrackWriter::new(dir.path()).await.unwrap();
        let track: Vec<PositionReport> =
            serde_json::from_str(r#"[{"msgtime":"2025-07-25T00:10:00+00:00"}]"#).unwrap();

        let err = writer.save_track(&track).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord(_)));
        assert!(!err.is_file_system());
    }
}

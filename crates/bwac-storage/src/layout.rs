//! Output file naming.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{StorageError, StorageResult};

/// `AIS_<YYYY>_<MM>_<DD>.csv`
pub fn live_file_name(day_key: &str) -> String {
    format!("AIS_{}.csv", day_key)
}

/// `AIS_<YYYY>_<MM>_<DD>_<mmsi>.csv`
pub fn track_file_name(day_key: &str, mmsi: &str) -> String {
    format!("AIS_{}_{}.csv", day_key, mmsi)
}

/// Create the output directory (and parents) if it does not exist.
pub async fn ensure_output_dir(root: &Path) -> StorageResult<PathBuf> {
    fs::create_dir_all(root)
        .await
        .map_err(|source| StorageError::CreateDir {
            path: root.to_path_buf(),
            source,
        })?;
    Ok(root.to_path_buf())
}

/// True if `path` is missing or empty, i.e. a header still has to be written.
pub async fn needs_header(path: &Path) -> StorageResult<bool> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

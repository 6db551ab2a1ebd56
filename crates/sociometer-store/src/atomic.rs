//! Crash-safe file replacement.
//!
//! Content is written to a sibling `*.tmp` file and renamed over the target, so
//! readers only ever observe the old or the new file in full.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::StoreError;

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `bytes` to `path` via write-temp-then-rename, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory, temp file, or rename fails.
/// On failure the previous content of `path` is left untouched.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        // Best effort: do not leave stray temp files behind.
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::io(path, e));
    }
    Ok(())
}

/// Pretty-prints `value` as JSON and writes it with [`write_atomic`].
///
/// # Errors
///
/// Returns [`StoreError::Serialize`] if `value` cannot be serialized, or any
/// error from [`write_atomic`].
pub async fn write_json_atomic<T>(path: &Path, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialize {
        context: path.display().to_string(),
        source: e,
    })?;
    write_atomic(path, &bytes).await
}

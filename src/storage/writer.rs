//! File writes for the persisted trees
//!
//! Every write lands in `<file>.part` first and is renamed into place, so an
//! interrupted run never leaves a truncated file under its final name.

use crate::{HarvestError, Result};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Suffix of in-flight files
pub const PART_SUFFIX: &str = ".part";

fn part_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

/// Writes `contents` to `path` atomically, checking for cancellation first
pub async fn write_atomic(path: &Path, contents: &[u8], cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(HarvestError::Cancelled);
    }

    let part = part_path(path);
    tokio::fs::write(&part, contents).await?;
    if let Err(e) = tokio::fs::rename(&part, path).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e.into());
    }

    tracing::debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Writes a JSON value pretty-printed
pub async fn write_pretty_json(
    path: &Path,
    value: &Value,
    cancel: &CancellationToken,
) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    write_atomic(path, text.as_bytes(), cancel).await
}

/// Returns true if a file exists at `path`
pub async fn file_exists(path: &Path) -> Result<bool> {
    Ok(tokio::fs::try_exists(path).await?)
}

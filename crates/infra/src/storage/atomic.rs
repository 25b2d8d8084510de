//! Atomic JSON document writes

use std::io::Write;
use std::path::{Path, PathBuf};

use calrelay_domain::{CalRelayError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::errors::InfraError;

/// Raw document contents, `None` when the file does not exist.
pub(crate) async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(InfraError::from(err).into()),
    }
}

/// Read and decode a JSON document, `None` when the file does not exist.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match read_bytes(path).await? {
        Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| InfraError::from(e).into()),
        None => Ok(None),
    }
}

/// Replace `path` with the JSON encoding of `value`.
///
/// The document is written to a temporary file in the same directory, synced
/// and renamed over the target, so readers see either the old or the new
/// document.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(InfraError::from)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || persist(&path, &bytes))
        .await
        .map_err(|e| CalRelayError::Internal(format!("state writer task failed: {e}")))?
}

fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(InfraError::from)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(InfraError::from)?;
    tmp.write_all(bytes).map_err(InfraError::from)?;
    tmp.as_file().sync_all().map_err(InfraError::from)?;
    tmp.persist(path).map_err(InfraError::from)?;
    Ok(())
}

//! Per-resource sync state records on disk

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calrelay_core::StateStore;
use calrelay_domain::{ResourceId, Result, SyncState};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::atomic::{read_bytes, write_json};

static UNSAFE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("UNSAFE_RUN should compile - this is a bug"));

/// File-system safe form of a resource id.
///
/// Every run of characters outside `[A-Za-z0-9._-]` collapses to one `_`, so
/// ids differing only in such characters share a record.
pub fn safe_name(resource: &ResourceId) -> String {
    UNSAFE_RUN.replace_all(resource.as_str(), "_").into_owned()
}

/// One `state_<safe>.json` document per resource under a state directory.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, resource: &ResourceId) -> PathBuf {
        self.dir.join(format!("state_{}.json", safe_name(resource)))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, resource: &ResourceId) -> Result<SyncState> {
        let path = self.path_for(resource);
        let Some(bytes) = read_bytes(&path).await? else {
            debug!(resource = %resource, path = %path.display(), "no state record yet");
            return Ok(SyncState::default());
        };

        match serde_json::from_slice::<SyncState>(&bytes) {
            Ok(state) => Ok(state),
            // A corrupt record only loses the cursor; the next pass
            // re-establishes a baseline without emitting diffs.
            Err(err) => {
                warn!(resource = %resource, path = %path.display(), error = %err, "discarding corrupt state record");
                Ok(SyncState::default())
            }
        }
    }

    async fn save(&self, resource: &ResourceId, state: &SyncState) -> Result<()> {
        let path = self.path_for(resource);
        write_json(&path, state).await?;
        debug!(resource = %resource, items = state.items.len(), has_cursor = state.cursor.is_some(), "state saved");
        Ok(())
    }
}

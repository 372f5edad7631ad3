//! Persisted watermarks (`state.json` in the data directory).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use roomsync_core::WatermarkStore;

const STATE_FILE: &str = "state.json";

/// The on-disk watermark store.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// State file inside a data directory.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STATE_FILE),
        }
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store. A missing file is an empty store.
    pub async fn load(&self) -> Result<WatermarkStore> {
        if !self.path.exists() {
            return Ok(WatermarkStore::new());
        }
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&contents).context("Invalid sync state")
    }

    /// Save the store, replacing the file atomically.
    pub async fn save(&self, store: &WatermarkStore) -> Result<()> {
        let contents = serde_json::to_string_pretty(store)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .context("Failed to save sync state")?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .context("Failed to save sync state")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_core::{CollectionKind, Watermark};
    use roomsync_types::RoomUuid;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let state = StateFile::in_dir(dir.path());

        assert!(state.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn state_roundtrip() {
        let dir = tempdir().unwrap();
        let state = StateFile::in_dir(dir.path());
        let room = RoomUuid::new("r1").unwrap();
        let mut store = WatermarkStore::new();
        store.commit(&room, CollectionKind::UserStreams, Watermark::new(150));

        state.save(&store).await.unwrap();
        let loaded = state.load().await.unwrap();

        assert_eq!(loaded.get(&room, CollectionKind::UserStreams), Watermark::new(150));
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let state = StateFile::in_dir(dir.path());
        tokio::fs::write(state.path(), "not json").await.unwrap();

        assert!(state.load().await.is_err());
    }
}

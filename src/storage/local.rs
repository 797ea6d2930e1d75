//! Local filesystem storage implementation.
//!
//! The snapshot is a single pretty-printed JSON file. Writes go to a sibling
//! temp file which is then renamed over the target, so readers never see a
//! half-written snapshot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::SnapshotStore;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage persisting to the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load(&self) -> Result<Snapshot> {
        let bytes = match self.read_bytes().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::warn!("No snapshot found at {}", self.path.display());
                return Ok(Snapshot::default());
            }
            Err(e) => {
                log::warn!(
                    "Failed to read snapshot {} ({}), starting empty",
                    self.path.display(),
                    e
                );
                return Ok(Snapshot::default());
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            log::warn!("Snapshot {} is empty", self.path.display());
            return Ok(Snapshot::default());
        }

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => {
                log::info!(
                    "Loaded snapshot: {} channels, {} videos",
                    snapshot.channels.len(),
                    snapshot.videos.len()
                );
                Ok(snapshot)
            }
            Err(e) => {
                log::warn!(
                    "Snapshot {} is corrupt ({}), starting empty",
                    self.path.display(),
                    e
                );
                Ok(Snapshot::default())
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write_bytes(&bytes).await?;
        log::info!(
            "Snapshot saved to {}: {} channels, {} videos",
            self.path.display(),
            snapshot.channels.len(),
            snapshot.videos.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelRecord, VideoRecord};
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            channels: vec![ChannelRecord {
                id: "UC1".to_string(),
                display_name: "메인 채널".to_string(),
                subscriber_count: 1200,
                observed_at: Utc::now(),
                notify_secondary: true,
            }],
            videos: vec![VideoRecord {
                id: "v1".to_string(),
                title: "First".to_string(),
                url: VideoRecord::watch_url("v1"),
                view_count: 42,
                observed_at: Utc::now(),
                source_playlist_id: "PL1".to_string(),
                source_playlist_label: "Uploads".to_string(),
                notify_secondary: false,
            }],
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("data/data.json"));

        let snapshot = sample_snapshot();
        storage.save(&snapshot).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!tmp.path().join("data/data.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nope.json"));

        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        tokio::fs::write(&path, b"{\"channels\": [").await.unwrap();

        let storage = LocalStorage::new(&path);
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_blank_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        tokio::fs::write(&path, b"\n").await.unwrap();

        let storage = LocalStorage::new(&path);
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_wholesale() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("data.json"));

        storage.save(&sample_snapshot()).await.unwrap();
        storage.save(&Snapshot::default()).await.unwrap();

        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_fails_when_parent_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        tokio::fs::write(&blocker, b"x").await.unwrap();

        let storage = LocalStorage::new(blocker.join("data.json"));
        assert!(storage.save(&sample_snapshot()).await.is_err());
    }
}

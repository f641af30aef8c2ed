//! Local filesystem storage implementation.
//!
//! Writes go to a sibling `.tmp` file that is then renamed over the target,
//! so a crash mid-write leaves the previous state intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::SeenSet;
use crate::storage::SeenStore;

/// JSON-file seen-set backend.
#[derive(Debug, Clone)]
pub struct LocalSeenStore {
    path: PathBuf,
}

impl LocalSeenStore {
    /// Create a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SeenStore for LocalSeenStore {
    async fn load(&self) -> SeenSet {
        let bytes = match self.read_bytes().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!(
                    "No seen-set at {}, starting empty",
                    self.path.display()
                );
                return SeenSet::new();
            }
            Err(e) => {
                log::warn!(
                    "Failed to read seen-set {}: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                return SeenSet::new();
            }
        };

        match serde_json::from_slice::<SeenSet>(&bytes) {
            Ok(seen) => {
                log::debug!(
                    "Loaded {} seen ids from {}",
                    seen.len(),
                    self.path.display()
                );
                seen
            }
            Err(e) => {
                log::warn!(
                    "Seen-set {} is corrupt: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                SeenSet::new()
            }
        }
    }

    async fn save(&self, seen: &SeenSet) -> Result<()> {
        let bytes = serde_json::to_vec(seen)?;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::persist(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalSeenStore::new(tmp.path().join("sent_posts.json"));

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent_posts.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = LocalSeenStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shape_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent_posts.json");
        std::fs::write(&path, br#"{"ids": ["a"]}"#).unwrap();

        let store = LocalSeenStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/sent_posts.json");
        let store = LocalSeenStore::new(&path);

        let seen: SeenSet = ["b", "a"].into_iter().collect();
        store.save(&seen).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"["a","b"]"#);
        assert_eq!(store.load().await, seen);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_save_into_unwritable_location_is_persist_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        // Parent path is a regular file, so the directory cannot be created.
        let store = LocalSeenStore::new(blocker.join("sent_posts.json"));
        let result = store.save(&SeenSet::new()).await;
        assert!(matches!(result, Err(AppError::Persist(_))));
    }
}

//! Filesystem artifact store.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{ArtifactReader, ArtifactRef, ArtifactStore, StoredArtifact};
use crate::error::{AppError, Result};

/// Filesystem-based artifact store keeping one file per build.
pub struct FilesystemStore {
    base_path: PathBuf,
}

impl FilesystemStore {
    /// Create a new filesystem store rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Create the storage directory if it does not exist yet
    pub async fn ensure_base_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Build a fresh key: a uniqueness token plus the sanitized upload name.
    /// Sanitizing strips path separators, so keys never escape the base dir.
    fn fresh_key(suggested_name: &str) -> String {
        let mut name: String = suggested_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if name.trim_matches(['_', '.']).is_empty() {
            name = "artifact".to_string();
        }
        format!("{}_{}", Uuid::new_v4().simple(), name)
    }
}

#[async_trait]
impl ArtifactStore for FilesystemStore {
    async fn store(&self, suggested_name: &str, content: Bytes) -> Result<StoredArtifact> {
        let key = Self::fresh_key(suggested_name);
        let path = self.key_to_path(&key);
        let size_bytes = content.len() as i64;

        fs::create_dir_all(&self.base_path).await?;

        let write = async {
            let mut file = fs::File::create(&path).await?;
            file.write_all(&content).await?;
            file.sync_all().await?;
            Ok::<(), std::io::Error>(())
        };

        if let Err(e) = write.await {
            // Never leave a half-written file for a ref nobody holds
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        Ok(StoredArtifact {
            artifact: ArtifactRef::new(key),
            size_bytes,
        })
    }

    async fn open(&self, artifact: &ArtifactRef) -> Result<ArtifactReader> {
        let path = self.key_to_path(artifact.as_str());
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::ArtifactMissing(format!(
                "artifact {} is not present in storage",
                artifact
            ))),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to open {}: {}",
                artifact, e
            ))),
        }
    }

    async fn exists(&self, artifact: &ArtifactRef) -> Result<bool> {
        let path = self.key_to_path(artifact.as_str());
        match fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to stat {}: {}",
                artifact, e
            ))),
        }
    }

    async fn delete(&self, artifact: &ArtifactRef) -> Result<()> {
        let path = self.key_to_path(artifact.as_str());
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete {}: {}",
                artifact, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn store_in(dir: &tempfile::TempDir) -> FilesystemStore {
        FilesystemStore::new(dir.path())
    }

    #[tokio::test]
    async fn test_store_and_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let stored = store
            .store("fw-release.zip", Bytes::from_static(b"PK firmware bytes"))
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, 17);
        assert!(store.exists(&stored.artifact).await.unwrap());

        let mut reader = store.open(&stored.artifact).await.unwrap();
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await.unwrap();
        assert_eq!(content, b"PK firmware bytes");
    }

    #[tokio::test]
    async fn test_same_suggested_name_gets_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let a = store.store("fw.zip", Bytes::from_static(b"v1")).await.unwrap();
        let b = store.store("fw.zip", Bytes::from_static(b"v2")).await.unwrap();

        assert_ne!(a.artifact, b.artifact);
        assert!(store.exists(&a.artifact).await.unwrap());
        assert!(store.exists(&b.artifact).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let stored = store.store("fw.zip", Bytes::from_static(b"v1")).await.unwrap();
        store.delete(&stored.artifact).await.unwrap();
        assert!(!store.exists(&stored.artifact).await.unwrap());

        // Second delete of the same ref is not an error
        store.delete(&stored.artifact).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_missing_artifact_reports_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let err = store
            .open(&ArtifactRef::new("no-such-key"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::ArtifactMissing(_)));
    }

    #[tokio::test]
    async fn test_keys_never_contain_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let stored = store
            .store("../../etc/passwd", Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert!(!stored.artifact.as_str().contains('/'));
        assert!(store.exists(&stored.artifact).await.unwrap());
    }
}

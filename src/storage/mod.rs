//! Artifact storage.
//!
//! Registry rows carry an opaque [`ArtifactRef`] rather than a raw path;
//! only the store knows how references map to physical files.

pub mod filesystem;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use tokio::io::AsyncRead;

use crate::error::Result;

/// Opaque reference to a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful store call. Holding one proves the artifact was
/// fully persisted before any registry row references it.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub artifact: ArtifactRef,
    pub size_bytes: i64,
}

/// Boxed reader over an artifact's bytes, suitable for response streaming.
pub type ArtifactReader = Pin<Box<dyn AsyncRead + Send>>;

/// Artifact store trait
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist content under a fresh collision-free key derived from the
    /// suggested name. Fails without leaving a partial artifact behind.
    async fn store(&self, suggested_name: &str, content: Bytes) -> Result<StoredArtifact>;

    /// Open an artifact for reading. Fails with `ArtifactMissing` when the
    /// file is gone even though a reference to it exists.
    async fn open(&self, artifact: &ArtifactRef) -> Result<ArtifactReader>;

    /// Check whether the artifact's physical file is present
    async fn exists(&self, artifact: &ArtifactRef) -> Result<bool>;

    /// Delete the physical file. Idempotent: an already-absent file is Ok.
    async fn delete(&self, artifact: &ArtifactRef) -> Result<()>;
}

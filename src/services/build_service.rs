//! Build registry service.
//!
//! Owns the authoritative builds table: upload, listing, and deletion with
//! best-effort removal of the backing artifact file.

use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::models::build::Build;
use crate::storage::{ArtifactRef, ArtifactStore, StoredArtifact};

const BUILD_COLUMNS: &str = "id, name, build_number, description, uploader, \
     printer_type, sub_type, make, file_name, storage_key, size_bytes, \
     checksum_sha256, uploaded_at";

/// Build registry service
pub struct BuildService {
    db: PgPool,
    store: Arc<dyn ArtifactStore>,
}

/// Metadata fields accompanying an uploaded firmware file.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBuildInput {
    pub name: String,
    pub build_number: String,
    pub description: String,
    pub uploader: String,
    pub printer_type: String,
    pub sub_type: String,
    pub make: String,
}

impl CreateBuildInput {
    /// Reject empty required fields. The build number is allowed to be
    /// empty: it is a free-text label, not an ordering key.
    fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("uploader", &self.uploader),
            ("printer_type", &self.printer_type),
            ("sub_type", &self.sub_type),
            ("make", &self.make),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

impl BuildService {
    /// Create a new build registry service
    pub fn new(db: PgPool, store: Arc<dyn ArtifactStore>) -> Self {
        Self { db, store }
    }

    /// Calculate SHA-256 checksum of data
    pub fn calculate_sha256(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Accept an uploaded firmware payload: validate the metadata, persist
    /// the artifact, then register the build row. The artifact write
    /// happens before the insert, so no row ever points at a file that
    /// failed to persist.
    pub async fn upload(
        &self,
        input: CreateBuildInput,
        file_name: &str,
        data: Bytes,
    ) -> Result<Build> {
        input.validate()?;
        if data.is_empty() {
            return Err(AppError::Validation("firmware payload is empty".into()));
        }

        let checksum_sha256 = Self::calculate_sha256(&data);
        let stored = self.store.store(file_name, data).await?;

        match self.create(&input, file_name, &stored, &checksum_sha256).await {
            Ok(build) => Ok(build),
            Err(e) => {
                // The row never landed; drop the orphaned file
                if let Err(del) = self.store.delete(&stored.artifact).await {
                    warn!(artifact = %stored.artifact, error = %del,
                        "failed to clean up artifact after registry insert error");
                }
                Err(e)
            }
        }
    }

    /// Insert the registry row for an already-stored artifact. The database
    /// assigns both the identity and the upload timestamp.
    async fn create(
        &self,
        input: &CreateBuildInput,
        file_name: &str,
        stored: &StoredArtifact,
        checksum_sha256: &str,
    ) -> Result<Build> {
        let sql = format!(
            r#"
            INSERT INTO builds (name, build_number, description, uploader,
                                printer_type, sub_type, make,
                                file_name, storage_key, size_bytes, checksum_sha256)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {BUILD_COLUMNS}
            "#
        );

        let build: Build = sqlx::query_as(&sql)
            .bind(&input.name)
            .bind(&input.build_number)
            .bind(&input.description)
            .bind(&input.uploader)
            .bind(&input.printer_type)
            .bind(&input.sub_type)
            .bind(&input.make)
            .bind(file_name)
            .bind(stored.artifact.as_str())
            .bind(stored.size_bytes)
            .bind(checksum_sha256)
            .fetch_one(&self.db)
            .await?;

        Ok(build)
    }

    /// List all builds, newest upload first.
    pub async fn list(&self) -> Result<Vec<Build>> {
        let sql = format!("SELECT {BUILD_COLUMNS} FROM builds ORDER BY uploaded_at DESC, id DESC");
        Ok(sqlx::query_as(&sql).fetch_all(&self.db).await?)
    }

    /// Delete a build and its artifact.
    ///
    /// The row lock makes concurrent deletes of the same id serialize: the
    /// loser sees no row and reports `NotFound` instead of double-freeing
    /// the file. Physical deletion is attempted first but its failure only
    /// gets logged; the registry row is removed regardless.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let storage_key: Option<String> =
            sqlx::query_scalar("SELECT storage_key FROM builds WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(storage_key) = storage_key else {
            return Err(AppError::NotFound(format!("build {} not found", id)));
        };

        let artifact = ArtifactRef::new(storage_key);
        if let Err(e) = self.store.delete(&artifact).await {
            warn!(build_id = id, artifact = %artifact, error = %e,
                "failed to remove artifact file; deleting registry row anyway");
        }

        sqlx::query("DELETE FROM builds WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateBuildInput {
        CreateBuildInput {
            name: "fw-release".into(),
            build_number: "12".into(),
            description: "nightly".into(),
            uploader: "ops".into(),
            printer_type: "Inkjet".into(),
            sub_type: "A1".into(),
            make: "AcmeCo".into(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_validate_allows_empty_build_number_and_description() {
        let mut i = input();
        i.build_number = String::new();
        i.description = String::new();
        assert!(i.validate().is_ok());
    }

    #[test]
    fn test_validate_lists_every_missing_field() {
        let mut i = input();
        i.name = String::new();
        i.make = "  ".into();
        let err = i.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("name"));
        assert!(msg.contains("make"));
        assert!(!msg.contains("uploader"));
    }

    #[test]
    fn test_sha256_of_known_input() {
        assert_eq!(
            BuildService::calculate_sha256(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

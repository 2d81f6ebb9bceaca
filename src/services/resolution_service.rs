//! Resolution engine.
//!
//! Maps a device profile plus build number to the single build that should
//! be served. Pure registry read, no filesystem access.

use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::build::Build;
use crate::models::printer::DeviceProfile;

/// Resolution service
pub struct ResolutionService {
    db: PgPool,
}

impl ResolutionService {
    /// Create a new resolution service
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Pick the build matching all four fields exactly, case-sensitively.
    ///
    /// Re-uploads under the same profile and number are legal; the most
    /// recent upload wins (latest-wins policy, tie-broken by id for rows
    /// sharing a timestamp). Runs as one query, so a build deleted
    /// concurrently is either returned whole or not at all.
    pub async fn resolve(&self, profile: &DeviceProfile, build_number: &str) -> Result<Build> {
        let build: Option<Build> = sqlx::query_as(
            r#"
            SELECT id, name, build_number, description, uploader,
                   printer_type, sub_type, make, file_name, storage_key,
                   size_bytes, checksum_sha256, uploaded_at
            FROM builds
            WHERE printer_type = $1 AND sub_type = $2 AND make = $3 AND build_number = $4
            ORDER BY uploaded_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(&profile.printer_type)
        .bind(&profile.sub_type)
        .bind(&profile.make)
        .bind(build_number)
        .fetch_optional(&self.db)
        .await?;

        build.ok_or_else(|| {
            AppError::NoMatch(format!(
                "no build for profile {} with number {:?}",
                profile, build_number
            ))
        })
    }
}

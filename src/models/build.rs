//! Build model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One uploaded firmware version for a device profile.
///
/// Rows are immutable except for deletion; `uploaded_at` is assigned by the
/// registry at insert time, never by the client.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Build {
    pub id: i64,
    pub name: String,
    pub build_number: String,
    pub description: String,
    pub uploader: String,
    pub printer_type: String,
    pub sub_type: String,
    pub make: String,
    /// Original filename from the upload form
    pub file_name: String,
    /// Opaque artifact store key; not exposed through the API
    pub storage_key: String,
    pub size_bytes: i64,
    pub checksum_sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

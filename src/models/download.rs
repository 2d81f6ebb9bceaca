//! Download audit model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Audit record of one resolved download attempt.
///
/// The row is written with status `initiated` before any bytes move, so the
/// attempt survives a mid-stream failure. `printer_id` and `build_id` are
/// weak references: deleting a build leaves its download rows in place.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Download {
    pub id: i64,
    pub printer_id: i64,
    pub build_id: i64,
    /// `initiated`, then `completed` or `failed` once the stream ends
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

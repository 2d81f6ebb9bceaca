//! Printer model and device profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// The triple identifying a class of requesting device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub printer_type: String,
    pub sub_type: String,
    pub make: String,
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.printer_type, self.sub_type, self.make)
    }
}

/// A registered device. Downloads reference printers by id, but no printer
/// row needs to pre-exist for resolution or download to succeed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Printer {
    pub id: i64,
    pub printer_type: String,
    pub sub_type: String,
    pub make: String,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub status: String,
}

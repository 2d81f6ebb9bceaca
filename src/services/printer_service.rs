//! Printer fleet service.

use serde::Deserialize;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::printer::Printer;

/// Printer registration and last-seen tracking.
pub struct PrinterService {
    db: PgPool,
}

/// Input for registering a printer.
#[derive(Debug, Deserialize)]
pub struct RegisterPrinterInput {
    pub printer_type: String,
    pub sub_type: String,
    pub make: String,
}

impl PrinterService {
    /// Create a new printer service
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a printer and return its assigned identity.
    pub async fn register(&self, input: RegisterPrinterInput) -> Result<Printer> {
        let printer: Printer = sqlx::query_as(
            r#"
            INSERT INTO printers (printer_type, sub_type, make)
            VALUES ($1, $2, $3)
            RETURNING id, printer_type, sub_type, make, last_seen_at, status
            "#,
        )
        .bind(&input.printer_type)
        .bind(&input.sub_type)
        .bind(&input.make)
        .fetch_one(&self.db)
        .await?;

        Ok(printer)
    }

    /// List the fleet, most recently seen first.
    pub async fn list(&self) -> Result<Vec<Printer>> {
        Ok(sqlx::query_as(
            r#"
            SELECT id, printer_type, sub_type, make, last_seen_at, status
            FROM printers
            ORDER BY last_seen_at DESC NULLS LAST, id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?)
    }

    /// Record that a printer just phoned in. A no-op for ids that were
    /// never registered; downloads do not require a printer row.
    pub async fn touch(&self, printer_id: i64) -> Result<()> {
        sqlx::query("UPDATE printers SET last_seen_at = NOW(), status = 'online' WHERE id = $1")
            .bind(printer_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

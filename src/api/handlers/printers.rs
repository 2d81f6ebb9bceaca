//! Printer fleet handlers.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::SharedState;
use crate::error::Result;
use crate::models::download::Download;
use crate::models::printer::Printer;
use crate::services::printer_service::RegisterPrinterInput;

/// Create printer routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_printers).post(register_printer))
        .route("/:id/downloads", get(list_printer_downloads))
}

/// Register a printer
pub async fn register_printer(
    State(state): State<SharedState>,
    Json(input): Json<RegisterPrinterInput>,
) -> Result<Json<Printer>> {
    let printer = state.printer_service().register(input).await?;
    tracing::info!(printer_id = printer.id, printer_type = %printer.printer_type,
        sub_type = %printer.sub_type, make = %printer.make, "registered printer");
    Ok(Json(printer))
}

/// List the printer fleet, most recently seen first
pub async fn list_printers(State(state): State<SharedState>) -> Result<Json<Vec<Printer>>> {
    Ok(Json(state.printer_service().list().await?))
}

/// List the download audit log for one printer, newest first
pub async fn list_printer_downloads(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Download>>> {
    Ok(Json(state.download_service().list_for_printer(id).await?))
}

//! Device-facing firmware download handler.

use axum::{
    body::Body,
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::api::firmware_response::FirmwareDownload;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::printer::DeviceProfile;

/// Create firmware routes
pub fn router() -> Router<SharedState> {
    Router::new().route("/download", get(download_firmware))
}

/// Raw query parameters as sent by a device
#[derive(Debug, Default, Deserialize)]
pub struct FirmwareQuery {
    pub printer_id: Option<i64>,
    pub printer_type: Option<String>,
    pub sub_type: Option<String>,
    pub make: Option<String>,
    pub build_number: Option<String>,
}

/// A fully-specified download request
#[derive(Debug)]
struct DownloadRequest {
    printer_id: i64,
    profile: DeviceProfile,
    build_number: String,
}

/// Every parameter is required; absent and empty are both missing. The
/// error names all the missing parameters at once so device firmware gets
/// one actionable message instead of a round-trip per field.
fn parse_query(query: FirmwareQuery) -> Result<DownloadRequest> {
    fn required(missing: &mut Vec<&'static str>, name: &'static str, value: Option<String>) -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => {
                missing.push(name);
                String::new()
            }
        }
    }

    let mut missing = Vec::new();
    if query.printer_id.is_none() {
        missing.push("printer_id");
    }
    let printer_type = required(&mut missing, "printer_type", query.printer_type);
    let sub_type = required(&mut missing, "sub_type", query.sub_type);
    let make = required(&mut missing, "make", query.make);
    let build_number = required(&mut missing, "build_number", query.build_number);

    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "missing required parameters: {}",
            missing.join(", ")
        )));
    }

    Ok(DownloadRequest {
        printer_id: query.printer_id.unwrap_or_default(),
        profile: DeviceProfile {
            printer_type,
            sub_type,
            make,
        },
        build_number,
    })
}

/// Resolve the device profile to a build and stream its artifact
pub async fn download_firmware(
    State(state): State<SharedState>,
    Query(query): Query<FirmwareQuery>,
) -> Result<FirmwareDownload> {
    let request = parse_query(query)?;

    let build = state
        .resolution_service()
        .resolve(&request.profile, &request.build_number)
        .await?;

    // Fleet bookkeeping only; an unregistered printer still gets served
    if let Err(e) = state.printer_service().touch(request.printer_id).await {
        tracing::warn!(printer_id = request.printer_id, error = %e,
            "failed to update printer last-seen");
    }

    let (download, stream) = state
        .download_service()
        .begin(request.printer_id, &build)
        .await?;

    tracing::info!(download_id = download.id, build_id = build.id,
        printer_id = request.printer_id, file = %build.file_name,
        "streaming firmware build");

    Ok(FirmwareDownload {
        build_id: build.id,
        file_name: build.file_name.clone(),
        size_bytes: build.size_bytes,
        body: Body::from_stream(stream),
    })
}

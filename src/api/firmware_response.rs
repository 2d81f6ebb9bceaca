//! Firmware download response helper.
//!
//! Builds the streamed attachment response for a resolved build, with
//! headers identifying which build was served.

use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Header carrying the resolved build identity
pub const X_FIRMWARE_BUILD: &str = "x-firmware-build";

/// Streamed firmware payload for a resolved build
pub struct FirmwareDownload {
    pub build_id: i64,
    pub file_name: String,
    pub size_bytes: i64,
    pub body: Body,
}

impl IntoResponse for FirmwareDownload {
    fn into_response(self) -> Response {
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/zip")
            .header(CONTENT_LENGTH, self.size_bytes)
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", self.file_name),
            )
            .header(X_FIRMWARE_BUILD, self.build_id)
            .body(self.body)
            .unwrap()
    }
}

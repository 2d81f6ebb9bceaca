//! Build management handlers: upload, listing, deletion.

use axum::{
    extract::{Multipart, Path, State},
    routing::{delete, get},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::build::Build;
use crate::services::build_service::CreateBuildInput;

/// Create build routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_builds).post(upload_build))
        .route("/:id", delete(delete_build))
}

/// Build row as exposed through the API. The storage key stays internal.
#[derive(Debug, Serialize)]
pub struct BuildResponse {
    pub id: i64,
    pub name: String,
    pub build_number: String,
    pub description: String,
    pub uploader: String,
    pub printer_type: String,
    pub sub_type: String,
    pub make: String,
    pub file_name: String,
    pub size_bytes: i64,
    pub checksum_sha256: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<Build> for BuildResponse {
    fn from(build: Build) -> Self {
        Self {
            id: build.id,
            name: build.name,
            build_number: build.build_number,
            description: build.description,
            uploader: build.uploader,
            printer_type: build.printer_type,
            sub_type: build.sub_type,
            make: build.make,
            file_name: build.file_name,
            size_bytes: build.size_bytes,
            checksum_sha256: build.checksum_sha256,
            uploaded_at: build.uploaded_at,
        }
    }
}

/// Multipart form fields for an upload. Field names follow the operator
/// upload form: `build` is the human name, `version` the build number,
/// `zipFile` the payload.
#[derive(Debug, Default)]
struct UploadForm {
    name: String,
    build_number: String,
    description: String,
    uploader: String,
    printer_type: String,
    sub_type: String,
    make: String,
    file_name: String,
    payload: Option<Bytes>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart data: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "zipFile" {
            form.file_name = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| "firmware.zip".to_string());
            form.payload = Some(field.bytes().await.map_err(|e| {
                AppError::Validation(format!("failed to read firmware payload: {e}"))
            })?);
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("invalid field {name}: {e}")))?;
        match name.as_str() {
            "build" => form.name = text,
            "version" => form.build_number = text,
            "description" => form.description = text,
            "uploader" => form.uploader = text,
            "printer_type" => form.printer_type = text,
            "sub_type" => form.sub_type = text,
            "make" => form.make = text,
            _ => {}
        }
    }

    Ok(form)
}

/// Upload a firmware build
pub async fn upload_build(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Json<BuildResponse>> {
    let form = read_upload_form(multipart).await?;

    let Some(payload) = form.payload else {
        return Err(AppError::Validation(
            "missing firmware file field zipFile".to_string(),
        ));
    };

    let input = CreateBuildInput {
        name: form.name,
        build_number: form.build_number,
        description: form.description,
        uploader: form.uploader,
        printer_type: form.printer_type,
        sub_type: form.sub_type,
        make: form.make,
    };

    let build = state
        .build_service()
        .upload(input, &form.file_name, payload)
        .await?;

    tracing::info!(build_id = build.id, name = %build.name, uploader = %build.uploader,
        "registered firmware build");

    Ok(Json(BuildResponse::from(build)))
}

/// List builds, newest upload first
pub async fn list_builds(State(state): State<SharedState>) -> Result<Json<Vec<BuildResponse>>> {
    let builds = state.build_service().list().await?;
    Ok(Json(builds.into_iter().map(BuildResponse::from).collect()))
}

/// Delete a build by id
pub async fn delete_build(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    state.build_service().delete(id).await?;
    tracing::info!(build_id = id, "deleted firmware build");
    Ok(Json(json!({ "deleted": id })))
}

//! Application error types and result alias.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Validation error (missing or malformed request fields)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error (delete or lookup of a nonexistent id)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resolution found no build for the requested profile
    #[error("No matching build: {0}")]
    NoMatch(String),

    /// Build row exists but its artifact file is gone from storage
    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    /// Artifact storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Address parse error
    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database operation failed".to_string(),
            ),
            AppError::Migration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MIGRATION_ERROR",
                "Database migration failed".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::NoMatch(msg) => (StatusCode::NOT_FOUND, "NO_MATCH", msg.clone()),
            // Metadata intact but payload gone: a storage anomaly, not a bad
            // request, so this is deliberately not a 404.
            AppError::ArtifactMissing(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ARTIFACT_MISSING",
                msg.clone(),
            ),
            AppError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                msg.clone(),
            ),
            AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                "IO operation failed".to_string(),
            ),
            AppError::AddrParse(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ADDR_PARSE_ERROR",
                "Invalid address".to_string(),
            ),
        };

        // Log the error
        tracing::error!(error = %self, code = code, "Request error");

        let body = Json(json!({
            "code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        assert_eq!(
            status_of(AppError::Validation("missing field".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_no_match_and_not_found_map_to_not_found() {
        assert_eq!(
            status_of(AppError::NoMatch("no build".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::NotFound("build 7".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_artifact_missing_is_a_server_error_not_a_not_found() {
        assert_eq!(
            status_of(AppError::ArtifactMissing("build 3".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_maps_to_server_error() {
        assert_eq!(
            status_of(AppError::Storage("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

//! Route definitions for the API.

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::SharedState;

/// Uploads carry whole firmware images; axum's 2 MB default would silently
/// reject them.
const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        // Devices and the operator UI call in from arbitrary origins
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes() -> Router<SharedState> {
    Router::new()
        .nest("/builds", handlers::builds::router())
        .nest("/firmware", handlers::firmware::router())
        .nest("/printers", handlers::printers::router())
}

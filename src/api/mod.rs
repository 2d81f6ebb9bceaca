//! API module - HTTP handlers and shared state.

pub mod firmware_response;
pub mod handlers;
pub mod routes;

use crate::config::Config;
use crate::services::build_service::BuildService;
use crate::services::download_service::DownloadService;
use crate::services::printer_service::PrinterService;
use crate::services::resolution_service::ResolutionService;
use crate::storage::ArtifactStore;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    pub storage: Arc<dyn ArtifactStore>,
}

impl AppState {
    pub fn new(config: Config, db: PgPool, storage: Arc<dyn ArtifactStore>) -> Self {
        Self {
            config,
            db,
            storage,
        }
    }

    /// Create a BuildService over the shared pool and store.
    pub fn build_service(&self) -> BuildService {
        BuildService::new(self.db.clone(), self.storage.clone())
    }

    /// Create a ResolutionService over the shared pool.
    pub fn resolution_service(&self) -> ResolutionService {
        ResolutionService::new(self.db.clone())
    }

    /// Create a DownloadService over the shared pool and store.
    pub fn download_service(&self) -> DownloadService {
        DownloadService::new(self.db.clone(), self.storage.clone())
    }

    /// Create a PrinterService over the shared pool.
    pub fn printer_service(&self) -> PrinterService {
        PrinterService::new(self.db.clone())
    }
}

pub type SharedState = Arc<AppState>;

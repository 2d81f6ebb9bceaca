//! Firmware Depot - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use firmware_depot::{
    api, db,
    error::Result,
    storage::{filesystem::FilesystemStore, ArtifactStore},
    telemetry, Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    telemetry::init_tracing();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting Firmware Depot");

    // Connect to database
    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // Prepare the artifact directory
    let store = FilesystemStore::new(&config.storage_path);
    store.ensure_base_dir().await?;
    tracing::info!(path = %config.storage_path, "Artifact store ready");
    let store: Arc<dyn ArtifactStore> = Arc::new(store);

    // Build router
    let state = Arc::new(api::AppState::new(config.clone(), db_pool, store));
    let app = api::routes::create_router(state);

    // Start server
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

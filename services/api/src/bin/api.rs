//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, FileCatalogLoader, InMemoryStore, UsdaFoodAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use nutrilog_core::FoodCatalog;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Food Lookup Adapters ---
    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    let usda = Arc::new(UsdaFoodAdapter::new(
        http_client,
        config.usda_base_url.clone(),
        config.usda_api_key.clone(),
    ));
    let catalog = Arc::new(FoodCatalog::new(Arc::new(FileCatalogLoader::new(
        config.catalog_data_dir.clone(),
    ))));

    // --- 3. Connect to Storage & Build the Shared AppState ---
    let app_state = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            AppState::with_store(db_adapter, usda, catalog, config.clone())
        }
        None => {
            warn!("DATABASE_URL is not set; data is kept in memory and lost on restart");
            AppState::with_store(Arc::new(InMemoryStore::new()), usda, catalog, config.clone())
        }
    };

    // --- 4. Create the Web Router ---
    let app = build_router(Arc::new(app_state))?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

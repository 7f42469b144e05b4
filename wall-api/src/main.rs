use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;

use config::Config;
use repository::{MemoryWallStore, PgWallStore, WallStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wall_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Virtual Wall API...");

    let config = Config::from_env()?;

    tracing::info!(
        "Environment {}, table {} (key {})",
        config.environment,
        config.table_name,
        config.primary_key
    );

    let store = create_store(&config).await?;

    // Build router with all API endpoints
    let addr = config.bind_addr.clone();
    let app = api::create_router(api::AppState::new(store, config));

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

/// PostgreSQL when a database URL is configured, memory otherwise
async fn create_store(config: &Config) -> anyhow::Result<Arc<dyn WallStore>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, walls are kept in memory");
        return Ok(Arc::new(MemoryWallStore::new()));
    };

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(database_url).await?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool, &config.table_name, &config.primary_key).await?;

    Ok(Arc::new(PgWallStore::new(
        pool,
        &config.table_name,
        &config.primary_key,
    )))
}

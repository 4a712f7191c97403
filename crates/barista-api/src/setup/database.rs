//! Database setup and initialization

use anyhow::{Context, Result};
use barista_core::Config;
use barista_db::{ensure_schema, open_pool, PoolSettings};
use sqlx::PgPool;

/// Connect the pool and make sure the orders table exists
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.name,
        "Connecting to database..."
    );

    let settings = PoolSettings::from(&config.database);
    let pool = open_pool(&config.database_url(), &settings)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        "Database connected successfully"
    );

    ensure_schema(&pool)
        .await
        .context("Failed to create coffee_orders table")?;
    tracing::info!("Database schema ready");

    Ok(pool)
}

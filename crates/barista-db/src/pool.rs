//! Connection pool and schema bootstrap

use std::time::Duration;

use barista_core::{AppError, DatabaseConfig};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const CREATE_COFFEE_ORDERS: &str = r#"
CREATE TABLE IF NOT EXISTS coffee_orders (
    id SERIAL PRIMARY KEY,
    user_name VARCHAR(255) NOT NULL,
    coffee_type VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ DEFAULT NOW()
)
"#;

/// Pool sizing and connection lifetimes
#[derive(Clone, Debug)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_connections: 5,
            max_lifetime: Duration::from_secs(300),
            idle_timeout: Duration::from_secs(60),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&DatabaseConfig> for PoolSettings {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            min_connections: config.min_connections.min(config.max_connections),
            max_lifetime: config.max_lifetime,
            idle_timeout: config.idle_timeout,
            acquire_timeout: config.acquire_timeout,
        }
    }
}

/// Open a bounded pool and verify it with a round trip before handing it out.
pub async fn open_pool(dsn: &str, settings: &PoolSettings) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .max_lifetime(settings.max_lifetime)
        .idle_timeout(settings.idle_timeout)
        .acquire_timeout(settings.acquire_timeout)
        .connect(dsn)
        .await
        .map_err(AppError::Connection)?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(AppError::Connection)?;

    Ok(pool)
}

/// Create the `coffee_orders` table if it does not exist yet.
#[tracing::instrument(skip(pool), fields(db.table = "coffee_orders", db.operation = "create_table"))]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query(CREATE_COFFEE_ORDERS)
        .execute(pool)
        .await
        .map_err(|e| AppError::Schema(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use barista_core::Config;

    #[test]
    fn settings_follow_config() {
        let config = Config::from_lookup(|key| match key {
            "DB_MAX_CONNECTIONS" => Some("4".to_string()),
            "DB_MIN_CONNECTIONS" => Some("10".to_string()),
            _ => None,
        });
        let settings = PoolSettings::from(&config.database);
        assert_eq!(settings.max_connections, 4);
        assert_eq!(settings.min_connections, 4);
        assert_eq!(settings.max_lifetime, Duration::from_secs(300));
    }
}

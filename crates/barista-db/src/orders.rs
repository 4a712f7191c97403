use std::time::Duration;

use async_trait::async_trait;
use barista_core::{AppError, CoffeeOrder, CreateCoffeeOrder};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};

/// Typed access to the `coffee_orders` table.
///
/// Every call is a single round trip. Dropping the returned future cancels the
/// in-flight query and releases the connection back to the pool.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Round trip to the store
    async fn ping(&self) -> Result<(), AppError>;

    /// Fetch one order; `AppError::NotFound` when no row has this id
    async fn get_order(&self, id: i32) -> Result<CoffeeOrder, AppError>;

    /// Insert an order stamped with the store's current time
    async fn create_order(&self, order: &CreateCoffeeOrder) -> Result<CoffeeOrder, AppError>;

    /// Insert an order with an explicit `created_at`
    async fn create_order_at(
        &self,
        order: &CreateCoffeeOrder,
        created_at: DateTime<Utc>,
    ) -> Result<CoffeeOrder, AppError>;

    /// Count orders after sleeping server-side for `delay`
    async fn slow_count(&self, delay: Duration) -> Result<i64, AppError>;
}

/// PostgreSQL-backed order repository
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PgOrderRepository {
    #[tracing::instrument(skip(self), fields(db.operation = "ping"))]
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::Connection)?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "coffee_orders", db.operation = "select", db.record_id = %id))]
    async fn get_order(&self, id: i32) -> Result<CoffeeOrder, AppError> {
        let order = sqlx::query_as::<Postgres, CoffeeOrder>(
            "SELECT id, user_name, coffee_type, created_at FROM coffee_orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        order.ok_or_else(|| AppError::NotFound(format!("coffee order {} not found", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "coffee_orders", db.operation = "insert"))]
    async fn create_order(&self, order: &CreateCoffeeOrder) -> Result<CoffeeOrder, AppError> {
        let created = sqlx::query_as::<Postgres, CoffeeOrder>(
            r#"
            INSERT INTO coffee_orders (user_name, coffee_type)
            VALUES ($1, $2)
            RETURNING id, user_name, coffee_type, created_at
            "#,
        )
        .bind(&order.user_name)
        .bind(&order.coffee_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "coffee_orders", db.operation = "insert"))]
    async fn create_order_at(
        &self,
        order: &CreateCoffeeOrder,
        created_at: DateTime<Utc>,
    ) -> Result<CoffeeOrder, AppError> {
        let created = sqlx::query_as::<Postgres, CoffeeOrder>(
            r#"
            INSERT INTO coffee_orders (user_name, coffee_type, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_name, coffee_type, created_at
            "#,
        )
        .bind(&order.user_name)
        .bind(&order.coffee_type)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "coffee_orders", db.operation = "select"))]
    async fn slow_count(&self, delay: Duration) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM coffee_orders, pg_sleep($1)",
        )
        .bind(delay.as_secs_f64())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

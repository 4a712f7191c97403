//! In-memory [`OrderStore`] for tests and local runs without PostgreSQL.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use barista_core::{AppError, CoffeeOrder, CreateCoffeeOrder};
use chrono::{DateTime, Utc};

use crate::orders::OrderStore;

#[derive(Default)]
struct Table {
    next_id: i32,
    rows: BTreeMap<i32, CoffeeOrder>,
}

/// Mutex-guarded table with SERIAL-like id assignment.
///
/// `set_available(false)` makes every call fail with a connection error, the
/// same way an unreachable database would.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    table: Arc<Mutex<Table>>,
    unavailable: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// All stored orders, ordered by id
    pub fn orders(&self) -> Vec<CoffeeOrder> {
        self.table
            .lock()
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `get_order` calls served so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Connection(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn insert(
        &self,
        order: &CreateCoffeeOrder,
        created_at: DateTime<Utc>,
    ) -> Result<CoffeeOrder, AppError> {
        self.check_available()?;
        let mut table = self
            .table
            .lock()
            .map_err(|_| AppError::Internal("order table lock poisoned".to_string()))?;
        table.next_id += 1;
        let row = CoffeeOrder {
            id: table.next_id,
            user_name: order.user_name.clone(),
            coffee_type: order.coffee_type.clone(),
            created_at,
        };
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.check_available()
    }

    async fn get_order(&self, id: i32) -> Result<CoffeeOrder, AppError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let table = self
            .table
            .lock()
            .map_err(|_| AppError::Internal("order table lock poisoned".to_string()))?;
        table
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("coffee order {} not found", id)))
    }

    async fn create_order(&self, order: &CreateCoffeeOrder) -> Result<CoffeeOrder, AppError> {
        self.insert(order, Utc::now())
    }

    async fn create_order_at(
        &self,
        order: &CreateCoffeeOrder,
        created_at: DateTime<Utc>,
    ) -> Result<CoffeeOrder, AppError> {
        self.insert(order, created_at)
    }

    async fn slow_count(&self, delay: Duration) -> Result<i64, AppError> {
        self.check_available()?;
        tokio::time::sleep(delay).await;
        Ok(self.orders().len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = InMemoryOrderStore::new();
        let first = store
            .create_order(&CreateCoffeeOrder::new("Ada", "latte"))
            .await
            .unwrap();
        let second = store
            .create_order(&CreateCoffeeOrder::new("Linus", "espresso"))
            .await
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.get_order(1).await.unwrap(), first);
    }

    #[tokio::test]
    async fn missing_row_is_not_found() {
        let store = InMemoryOrderStore::new();
        let err = store.get_order(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn unavailable_store_fails_with_connection_error() {
        let store = InMemoryOrderStore::new();
        store.set_available(false);
        assert!(matches!(
            store.ping().await.unwrap_err(),
            AppError::Connection(_)
        ));
        assert!(store
            .create_order(&CreateCoffeeOrder::new("Ada", "latte"))
            .await
            .is_err());
        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }
}

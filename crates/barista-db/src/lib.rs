//! Data access layer
//!
//! Owns the PostgreSQL connection pool and exposes the coffee-order table through
//! the [`OrderStore`] trait. [`PgOrderRepository`] is the production
//! implementation; [`InMemoryOrderStore`] backs handler tests that should not
//! need a database.

pub mod memory;
pub mod orders;
pub mod pool;

pub use memory::InMemoryOrderStore;
pub use orders::{OrderStore, PgOrderRepository};
pub use pool::{ensure_schema, open_pool, PoolSettings};

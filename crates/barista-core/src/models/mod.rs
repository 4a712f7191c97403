//! Domain models

mod coffee_order;

pub use coffee_order::{CoffeeOrder, CreateCoffeeOrder};

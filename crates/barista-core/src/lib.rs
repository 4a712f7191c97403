//! Barista Core Library
//!
//! Domain models, error taxonomy and configuration shared by every barista crate.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{
    Config, DatabaseConfig, DemoConfig, ErrorStatusMode, LogFormat, MetricsBackend,
    MetricsConfig, TelemetryConfig,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{CoffeeOrder, CreateCoffeeOrder};

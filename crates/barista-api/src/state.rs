use std::sync::Arc;

use barista_core::{DemoConfig, ErrorStatusMode};
use barista_db::OrderStore;
use barista_infra::{MetricsEmitter, Tracing};

/// Shared application state handed to every handler
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub tracing: Tracing,
    pub metrics: Arc<MetricsEmitter>,
    pub region: String,
    pub demo: DemoConfig,
    pub error_status_mode: ErrorStatusMode,
}

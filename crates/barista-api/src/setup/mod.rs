//! Application setup and initialization
//!
//! Wires telemetry, the database pool, the metrics emitter and the router
//! together, and tears them down in reverse order on shutdown.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use barista_core::{Config, MetricsBackend};
use barista_db::PgOrderRepository;
use barista_infra::{
    init_telemetry, LogSink, MetricSink, MetricsEmitter, OtelMetricSink, TelemetryGuard,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use sqlx::PgPool;

use crate::state::AppState;

/// Everything `main` needs to serve requests and shut down cleanly
pub struct Application {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pool: PgPool,
    telemetry: TelemetryGuard,
}

impl Application {
    /// Drain queued metrics, close the pool, then flush spans and metrics.
    pub async fn shutdown(self) {
        self.state.metrics.shutdown().await;
        tracing::info!(
            dropped_batches = self.state.metrics.dropped_batches(),
            "Metrics emitter stopped"
        );

        self.pool.close().await;
        tracing::info!("Database pool closed");

        // Provider shutdown blocks until the exporters finish.
        let telemetry = self.telemetry;
        if let Err(e) = tokio::task::spawn_blocking(move || telemetry.shutdown()).await {
            tracing::warn!(error = %e, "Telemetry shutdown task failed");
        }
    }
}

/// Initialize the entire application
pub async fn initialize_app(config: &Config) -> Result<Application> {
    // Telemetry first so that everything after it is logged
    let (tracing_handle, telemetry) =
        init_telemetry(config).context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.environment,
        region = %config.region,
        otel_enabled = config.telemetry.enabled,
        "Configuration loaded"
    );

    let pool = database::setup_database(config).await?;

    let sink = metric_sink(config, telemetry.meter_provider());
    let metrics = Arc::new(MetricsEmitter::start(
        sink,
        config.metrics.workers,
        config.metrics.queue_capacity,
    ));

    let state = Arc::new(AppState {
        store: Arc::new(PgOrderRepository::new(pool.clone())),
        tracing: tracing_handle,
        metrics,
        region: config.region.clone(),
        demo: config.demo.clone(),
        error_status_mode: config.error_status_mode,
    });

    let router = routes::build_router(state.clone());

    Ok(Application {
        state,
        router,
        pool,
        telemetry,
    })
}

/// Pick the metrics destination.
///
/// Falls back to log output when the OTel backend is requested but no meter
/// provider exists (telemetry disabled).
fn metric_sink(config: &Config, provider: Option<&SdkMeterProvider>) -> Arc<dyn MetricSink> {
    let namespace = config.metrics.namespace.clone();
    match (config.metrics.backend, provider) {
        (MetricsBackend::Otel, Some(provider)) => {
            tracing::info!(namespace = %namespace, "Publishing metrics through OpenTelemetry");
            Arc::new(OtelMetricSink::new(provider, namespace))
        }
        (MetricsBackend::Otel, None) => {
            tracing::warn!(
                namespace = %namespace,
                "OpenTelemetry disabled; publishing metrics to the log instead"
            );
            Arc::new(LogSink::new(namespace))
        }
        (MetricsBackend::Log, _) => {
            tracing::info!(namespace = %namespace, "Publishing metrics to the log");
            Arc::new(LogSink::new(namespace))
        }
    }
}

//! Test helpers: build AppState and router for integration tests.
//!
//! The app runs over an in-memory order store, a metric sink that records
//! every point and an in-memory span exporter, so no database or collector
//! is needed: `cargo test -p barista-api`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use barista_api::setup::routes;
use barista_api::AppState;
use barista_core::{DemoConfig, ErrorStatusMode};
use barista_db::InMemoryOrderStore;
use barista_infra::{MetricPoint, MetricSink, MetricsEmitter, MetricsError, Tracing};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;

/// Metric sink that keeps every published point
#[derive(Clone, Default)]
pub struct RecordingSink {
    points: Arc<Mutex<Vec<MetricPoint>>>,
}

impl RecordingSink {
    pub fn points(&self) -> Vec<MetricPoint> {
        self.points.lock().unwrap().clone()
    }

    pub fn named(&self, name: &str) -> Vec<MetricPoint> {
        self.points()
            .into_iter()
            .filter(|p| p.name == name)
            .collect()
    }
}

#[async_trait]
impl MetricSink for RecordingSink {
    async fn publish(&self, batch: &[MetricPoint]) -> Result<(), MetricsError> {
        self.points.lock().unwrap().extend_from_slice(batch);
        Ok(())
    }
}

/// Test application: server plus handles on everything it observes.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: InMemoryOrderStore,
    pub sink: RecordingSink,
    pub spans: InMemorySpanExporter,
    _provider: TracerProvider,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Wait for queued metric batches to reach the sink and return them.
    /// Stops the emitter, so call it once, after the last request.
    pub async fn drain_metrics(&self) -> RecordingSink {
        self.state.metrics.shutdown().await;
        self.sink.clone()
    }

    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans.get_finished_spans().unwrap()
    }

    /// The one finished span called `name`
    pub fn server_span(&self, name: &str) -> SpanData {
        let mut matching: Vec<SpanData> = self
            .finished_spans()
            .into_iter()
            .filter(|s| s.name == name)
            .collect();
        assert_eq!(matching.len(), 1, "expected one span named {name}");
        matching.remove(0)
    }
}

/// Demo settings small enough for tests; the delay keeps its real value and
/// is only exercised with paused time.
pub fn test_demo_config() -> DemoConfig {
    DemoConfig {
        marek_alloc_mib: 4,
        marek_pause: Duration::from_millis(10),
        ..DemoConfig::default()
    }
}

pub fn state_for(
    store: InMemoryOrderStore,
    tracing: Tracing,
    sink: RecordingSink,
    demo: DemoConfig,
    error_status_mode: ErrorStatusMode,
) -> Arc<AppState> {
    Arc::new(AppState {
        store: Arc::new(store),
        tracing,
        metrics: Arc::new(MetricsEmitter::start(Arc::new(sink), 1, 1024)),
        region: "eu-central-1".to_string(),
        demo,
        error_status_mode,
    })
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(test_demo_config(), ErrorStatusMode::Uniform).await
}

pub async fn setup_test_app_with(demo: DemoConfig, error_status_mode: ErrorStatusMode) -> TestApp {
    build_test_app(demo, error_status_mode, routes::build_router).await
}

/// Same wiring as [`setup_test_app`], with the router built by `router`.
pub async fn build_test_app(
    demo: DemoConfig,
    error_status_mode: ErrorStatusMode,
    router: impl FnOnce(Arc<AppState>) -> Router,
) -> TestApp {
    let spans = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(spans.clone())
        .build();
    let tracing = Tracing::new(&provider, "barista-test");

    let store = InMemoryOrderStore::new();
    let sink = RecordingSink::default();
    let state = state_for(store.clone(), tracing, sink.clone(), demo, error_status_mode);

    let server = TestServer::new(router(state.clone())).expect("Failed to create test server");

    TestApp {
        server,
        state,
        store,
        sink,
        spans,
        _provider: provider,
    }
}

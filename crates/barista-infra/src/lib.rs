//! Barista Infrastructure Library
//!
//! Shared infrastructure used by the HTTP service:
//! - Telemetry initialization (log subscriber, OpenTelemetry tracer and meter providers)
//! - Asynchronous metric emission (bounded queue, worker pool, pluggable sinks)
//! - Request ID middleware
//! - Error response body

pub mod error;
pub mod metrics;
pub mod middleware;
pub mod telemetry;

// Re-export commonly used types
pub use error::ErrorResponse;
pub use metrics::{
    LogSink, MetricPoint, MetricSink, MetricUnit, MetricsEmitter, MetricsError, OtelMetricSink,
};
pub use middleware::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use telemetry::{
    init_subscriber, init_telemetry, trace_id, RequestTrace, TelemetryError, TelemetryGuard,
    Tracing,
};

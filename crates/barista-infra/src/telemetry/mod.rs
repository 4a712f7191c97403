//! Telemetry initialization
//!
//! Sets up the `tracing` subscriber for structured logs and the OpenTelemetry
//! tracer and meter providers. Nothing is installed globally: the [`Tracing`]
//! handle is passed to whoever starts spans, and the [`TelemetryGuard`] owns the
//! providers until it is shut down.

mod init;
mod subscriber;
mod tracer;

pub use init::{init_telemetry, parse_sampler, TelemetryError, TelemetryGuard};
pub use subscriber::init_subscriber;
pub use tracer::{trace_id, RequestTrace, Tracing};

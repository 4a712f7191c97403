//! Fire-and-forget metric emission
//!
//! Request handling never waits on a metrics backend: points are handed to
//! [`MetricsEmitter::emit`], which enqueues them on a bounded channel drained by
//! a fixed pool of workers. Workers hand each batch to a [`MetricSink`].
//! Delivery failures are logged and the batch is discarded.

mod emitter;
mod point;
mod sink;

pub use emitter::MetricsEmitter;
pub use point::{
    MetricPoint, MetricUnit, CREATED_COFFEE_ORDERS, ERROR_COUNT, REQUEST_COUNT, REQUEST_DURATION,
};
pub use sink::{LogSink, MetricSink, OtelMetricSink};

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("counter {name} cannot be decremented (value {value})")]
    NegativeCount { name: String, value: f64 },

    #[error("metric sink failed: {0}")]
    Sink(String),
}

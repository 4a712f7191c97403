use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use opentelemetry::metrics::{Counter, Histogram, Meter, MeterProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;

use super::{MetricPoint, MetricUnit, MetricsError};

/// Destination for metric batches
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn publish(&self, batch: &[MetricPoint]) -> Result<(), MetricsError>;
}

/// Writes each point as a structured log line
pub struct LogSink {
    namespace: String,
}

impl LogSink {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl MetricSink for LogSink {
    async fn publish(&self, batch: &[MetricPoint]) -> Result<(), MetricsError> {
        for point in batch {
            tracing::info!(
                namespace = %self.namespace,
                metric = %point.name,
                value = point.value,
                unit = point.unit.as_str(),
                dimensions = ?point.dimensions,
                timestamp = %point.timestamp,
                "metric"
            );
        }
        Ok(())
    }
}

/// Records points on OpenTelemetry instruments.
///
/// Durations go to histograms, counts to monotonic counters. Instruments are
/// created on first use and cached by name.
pub struct OtelMetricSink {
    meter: Meter,
    namespace: String,
    counters: Mutex<HashMap<String, Counter<f64>>>,
    histograms: Mutex<HashMap<String, Histogram<f64>>>,
}

impl OtelMetricSink {
    pub fn new(provider: &SdkMeterProvider, namespace: impl Into<String>) -> Self {
        Self {
            meter: provider.meter("barista"),
            namespace: namespace.into(),
            counters: Mutex::new(HashMap::new()),
            histograms: Mutex::new(HashMap::new()),
        }
    }

    fn instrument_name(&self, metric: &str) -> String {
        format!("{}.{}", self.namespace, metric)
    }

    fn counter(&self, point: &MetricPoint) -> Result<Counter<f64>, MetricsError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| MetricsError::Sink("counter cache poisoned".to_string()))?;
        let counter = counters.entry(point.name.clone()).or_insert_with(|| {
            self.meter
                .f64_counter(self.instrument_name(&point.name))
                .with_unit(point.unit.ucum())
                .build()
        });
        Ok(counter.clone())
    }

    fn histogram(&self, point: &MetricPoint) -> Result<Histogram<f64>, MetricsError> {
        let mut histograms = self
            .histograms
            .lock()
            .map_err(|_| MetricsError::Sink("histogram cache poisoned".to_string()))?;
        let histogram = histograms.entry(point.name.clone()).or_insert_with(|| {
            self.meter
                .f64_histogram(self.instrument_name(&point.name))
                .with_unit(point.unit.ucum())
                .build()
        });
        Ok(histogram.clone())
    }
}

#[async_trait]
impl MetricSink for OtelMetricSink {
    async fn publish(&self, batch: &[MetricPoint]) -> Result<(), MetricsError> {
        for point in batch {
            let attributes: Vec<KeyValue> = point
                .dimensions
                .iter()
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
                .collect();

            match point.unit {
                MetricUnit::Seconds => self.histogram(point)?.record(point.value, &attributes),
                MetricUnit::Count => {
                    if point.value < 0.0 {
                        return Err(MetricsError::NegativeCount {
                            name: point.name.clone(),
                            value: point.value,
                        });
                    }
                    self.counter(point)?.add(point.value, &attributes);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::metrics::PeriodicReader;
    use opentelemetry_sdk::testing::metrics::InMemoryMetricExporter;

    fn provider() -> (SdkMeterProvider, InMemoryMetricExporter) {
        let exporter = InMemoryMetricExporter::default();
        let reader =
            PeriodicReader::builder(exporter.clone(), opentelemetry_sdk::runtime::Tokio).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        (provider, exporter)
    }

    // The periodic reader flushes through a background task, which needs a
    // second worker thread.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn counters_and_histograms_are_recorded() {
        let (provider, exporter) = provider();
        let sink = OtelMetricSink::new(&provider, "barista.test");

        sink.publish(&[
            MetricPoint::request_count("/coffee", 201),
            MetricPoint::request_duration("/coffee", std::time::Duration::from_millis(20)),
        ])
        .await
        .unwrap();
        provider.force_flush().unwrap();

        let exported = exporter.get_finished_metrics().unwrap();
        let names: Vec<String> = exported
            .iter()
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .map(|m| m.name.to_string())
            .collect();
        assert!(names.contains(&"barista.test.RequestCount".to_string()));
        assert!(names.contains(&"barista.test.RequestDuration".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn negative_counts_are_rejected() {
        let (provider, _exporter) = provider();
        let sink = OtelMetricSink::new(&provider, "barista.test");
        let point = MetricPoint::new("ErrorCount", -1.0, MetricUnit::Count);

        let err = sink.publish(&[point]).await.unwrap_err();
        assert!(matches!(err, MetricsError::NegativeCount { .. }));
    }

    #[tokio::test]
    async fn log_sink_accepts_any_batch() {
        let sink = LogSink::new("barista.test");
        assert!(sink
            .publish(&[MetricPoint::orders_created("Ada", "latte")])
            .await
            .is_ok());
    }
}

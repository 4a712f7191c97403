use std::time::Duration;

use barista_core::Config;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    metrics::{self as sdkmetrics, PeriodicReader, SdkMeterProvider},
    trace::{self as sdktrace, BatchConfig, BatchSpanProcessor, RandomIdGenerator, Sampler},
    Resource,
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};

use super::subscriber::init_subscriber;
use super::tracer::Tracing;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),

    #[error("failed to build {signal} exporter: {message}")]
    Exporter {
        signal: &'static str,
        message: String,
    },
}

/// Owns the tracer and meter providers.
///
/// `shutdown` consumes the guard, so buffered spans and metrics are flushed
/// exactly once.
pub struct TelemetryGuard {
    tracer_provider: sdktrace::TracerProvider,
    meter_provider: Option<SdkMeterProvider>,
}

impl TelemetryGuard {
    pub fn new(
        tracer_provider: sdktrace::TracerProvider,
        meter_provider: Option<SdkMeterProvider>,
    ) -> Self {
        Self {
            tracer_provider,
            meter_provider,
        }
    }

    /// Meter provider backing the OpenTelemetry metric sink, when export is enabled
    pub fn meter_provider(&self) -> Option<&SdkMeterProvider> {
        self.meter_provider.as_ref()
    }

    pub fn shutdown(self) {
        tracing::info!("Shutting down OpenTelemetry...");

        for result in self.tracer_provider.force_flush() {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to flush spans");
            }
        }
        if let Err(e) = self.tracer_provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }

        if let Some(meter_provider) = self.meter_provider {
            if let Err(e) = meter_provider.shutdown() {
                tracing::warn!(error = %e, "Meter provider shutdown failed");
            }
        }

        tracing::info!("OpenTelemetry shutdown complete");
    }
}

/// Initialize logging and OpenTelemetry.
///
/// With `OTEL_ENABLED=false` spans are still created (so trace ids exist for
/// correlation headers and logs) but nothing is exported and no meter
/// provider is built.
pub fn init_telemetry(config: &Config) -> Result<(Tracing, TelemetryGuard), TelemetryError> {
    init_subscriber(config.log_format)?;

    let telemetry = &config.telemetry;
    let resource = build_resource(config);
    let sampler = parse_sampler(&telemetry.sampler, telemetry.sample_ratio);

    if !telemetry.enabled {
        let tracer_provider = sdktrace::TracerProvider::builder()
            .with_sampler(sampler)
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource)
            .build();
        tracing::info!("OpenTelemetry export disabled, spans stay in-process");

        let tracing = Tracing::new(&tracer_provider, telemetry.service_name.clone());
        return Ok((tracing, TelemetryGuard::new(tracer_provider, None)));
    }

    let endpoint = telemetry.endpoint.as_str();
    let use_http = telemetry.protocol == "http" || telemetry.protocol == "http/protobuf";

    let span_exporter = if use_http {
        opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(signal_endpoint(endpoint, "v1/traces"))
            .build()
    } else {
        opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
    }
    .map_err(|e| TelemetryError::Exporter {
        signal: "span",
        message: e.to_string(),
    })?;

    let batch_processor =
        BatchSpanProcessor::builder(span_exporter, opentelemetry_sdk::runtime::Tokio)
            .with_batch_config(BatchConfig::default())
            .build();

    let tracer_provider = sdktrace::TracerProvider::builder()
        .with_span_processor(batch_processor)
        .with_sampler(sampler)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource.clone())
        .build();

    let metric_exporter = if use_http {
        opentelemetry_otlp::MetricExporter::builder()
            .with_http()
            .with_endpoint(signal_endpoint(endpoint, "v1/metrics"))
            .with_temporality(sdkmetrics::Temporality::Cumulative)
            .build()
    } else {
        opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .with_temporality(sdkmetrics::Temporality::Cumulative)
            .build()
    }
    .map_err(|e| TelemetryError::Exporter {
        signal: "metric",
        message: e.to_string(),
    })?;

    let reader = PeriodicReader::builder(metric_exporter, opentelemetry_sdk::runtime::Tokio)
        .with_interval(Duration::from_secs(telemetry.metrics_interval_secs.max(1)))
        .build();

    let meter_provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build();

    tracing::info!(
        endpoint = %endpoint,
        protocol = %telemetry.protocol,
        environment = %config.environment,
        sampler = %telemetry.sampler,
        sample_ratio = telemetry.sample_ratio,
        metrics_interval_secs = telemetry.metrics_interval_secs,
        "OpenTelemetry initialized successfully"
    );

    let tracing = Tracing::new(&tracer_provider, telemetry.service_name.clone());
    Ok((
        tracing,
        TelemetryGuard::new(tracer_provider, Some(meter_provider)),
    ))
}

fn build_resource(config: &Config) -> Resource {
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.to_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    Resource::new(vec![
        KeyValue::new(SERVICE_NAME, config.telemetry.service_name.clone()),
        KeyValue::new(SERVICE_VERSION, config.telemetry.service_version.clone()),
        KeyValue::new("deployment.environment", config.environment.clone()),
        KeyValue::new("cloud.region", config.region.clone()),
        KeyValue::new("host.name", hostname),
        KeyValue::new("service.instance.id", uuid::Uuid::new_v4().to_string()),
    ])
}

/// The OTLP/HTTP exporter posts to the endpoint verbatim, so the per-signal
/// path is appended unless the caller already supplied one.
fn signal_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(path) {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Map `OTEL_SAMPLER`/`OTEL_SAMPLE_RATIO` onto an SDK sampler.
pub fn parse_sampler(sampler: &str, sample_ratio: f64) -> Sampler {
    match sampler {
        "always_off" => Sampler::AlwaysOff,
        "trace_id_ratio" => {
            let ratio = sample_ratio.clamp(0.0, 1.0);
            if ratio <= 0.0 {
                tracing::warn!("OTEL_SAMPLE_RATIO is 0.0 or negative, using AlwaysOff sampler");
                Sampler::AlwaysOff
            } else if ratio >= 1.0 {
                Sampler::AlwaysOn
            } else {
                Sampler::TraceIdRatioBased(ratio)
            }
        }
        _ => {
            if sampler != "always_on" {
                tracing::warn!(sampler = %sampler, "Unknown sampler type, defaulting to AlwaysOn");
            }
            Sampler::AlwaysOn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_parsing() {
        assert!(matches!(parse_sampler("always_on", 1.0), Sampler::AlwaysOn));
        assert!(matches!(parse_sampler("always_off", 1.0), Sampler::AlwaysOff));
        assert!(matches!(parse_sampler("trace_id_ratio", 0.0), Sampler::AlwaysOff));
        assert!(matches!(parse_sampler("trace_id_ratio", 4.0), Sampler::AlwaysOn));
        assert!(matches!(
            parse_sampler("trace_id_ratio", 0.25),
            Sampler::TraceIdRatioBased(r) if (r - 0.25).abs() < f64::EPSILON
        ));
        assert!(matches!(parse_sampler("bogus", 0.5), Sampler::AlwaysOn));
    }

    #[test]
    fn http_endpoint_gets_signal_path() {
        assert_eq!(
            signal_endpoint("http://collector:4318", "v1/traces"),
            "http://collector:4318/v1/traces"
        );
        assert_eq!(
            signal_endpoint("http://collector:4318/", "v1/metrics"),
            "http://collector:4318/v1/metrics"
        );
        assert_eq!(
            signal_endpoint("http://collector:4318/v1/traces", "v1/traces"),
            "http://collector:4318/v1/traces"
        );
    }
}

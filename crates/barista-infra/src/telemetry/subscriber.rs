use barista_core::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::TelemetryError;

const DEFAULT_FILTER: &str = "barista=debug,tower_http=info";

/// Install the process-wide log subscriber.
///
/// JSON output carries the fields of the enclosing span on every event, which
/// is how request and trace ids reach log lines emitted deep inside handlers.
pub fn init_subscriber(format: LogFormat) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    };

    result.map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

//! Configuration module
//!
//! Runtime settings are resolved from the process environment (optionally seeded
//! from a `.env` file). Loading never fails: a variable that is unset or does not
//! parse falls back to its documented default.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

// Database defaults
const DB_HOST: &str = "localhost";
const DB_PORT: u16 = 5432;
const DB_NAME: &str = "observability_demo";
const DB_USER: &str = "postgres";
const DB_PASSWORD: &str = "password";
const DB_SSL_MODE: &str = "prefer";
const MAX_CONNECTIONS: u32 = 25;
const MIN_CONNECTIONS: u32 = 5;
const MAX_LIFETIME_SECS: u64 = 300;
const IDLE_TIMEOUT_SECS: u64 = 60;
const ACQUIRE_TIMEOUT_SECS: u64 = 30;

// Service defaults
const SERVER_PORT: u16 = 8080;
const REGION: &str = "eu-central-1";
const ENVIRONMENT: &str = "demo";

// Telemetry defaults
const OTEL_ENDPOINT: &str = "http://localhost:4317";
const OTEL_PROTOCOL: &str = "grpc";
const OTEL_SERVICE_NAME: &str = "barista";
const OTEL_SAMPLER: &str = "always_on";
const OTEL_SAMPLE_RATIO: f64 = 1.0;
const OTEL_METRICS_INTERVAL_SECS: u64 = 30;

// Metrics emitter defaults
const METRICS_NAMESPACE: &str = "barista.demo";
const METRICS_WORKERS: usize = 2;
const METRICS_QUEUE_CAPACITY: usize = 1024;

// Demo handler defaults
const TOM_DELAY_MS: u64 = 3000;
const MAREK_ALLOC_MIB: usize = 250;
const MAREK_PAUSE_MS: u64 = 1000;
const VIKING_EXTRA_READS: i32 = 10;
const MATUS_COFFEE_TYPE: &str = "borovicka";
const MILA_OFFSET_SECS: i64 = 2 * 60 * 60;

/// Log output format for the fmt layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "compact" | "pretty" | "text" => Ok(LogFormat::Compact),
            _ => Err(()),
        }
    }
}

/// How handler failures map onto HTTP status codes.
///
/// `Uniform` reports every handler failure as 500, which is what the demo
/// dashboards are built around. `Typed` uses each error's own status (400, 404, 409...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorStatusMode {
    Uniform,
    Typed,
}

impl FromStr for ErrorStatusMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uniform" => Ok(ErrorStatusMode::Uniform),
            "typed" => Ok(ErrorStatusMode::Typed),
            _ => Err(()),
        }
    }
}

/// Where metric batches are delivered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricsBackend {
    /// OpenTelemetry meter provider (OTLP export)
    Otel,
    /// Structured log lines only
    Log,
}

impl FromStr for MetricsBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "otel" | "otlp" | "opentelemetry" => Ok(MetricsBackend::Otel),
            "log" | "logs" | "stdout" => Ok(MetricsBackend::Log),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
    /// Full DSN; takes precedence over the individual fields when set
    pub url_override: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Connection string for the store.
    pub fn url(&self) -> String {
        if let Some(url) = &self.url_override {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            utf8_percent_encode(&self.user, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.password, NON_ALPHANUMERIC),
            self.host,
            self.port,
            utf8_percent_encode(&self.name, NON_ALPHANUMERIC),
            self.ssl_mode,
        )
    }
}

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub protocol: String,
    pub service_name: String,
    pub service_version: String,
    pub sampler: String,
    pub sample_ratio: f64,
    pub metrics_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MetricsConfig {
    pub backend: MetricsBackend,
    pub namespace: String,
    pub workers: usize,
    pub queue_capacity: usize,
}

/// Knobs for the deliberately misbehaving demo endpoints.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub tom_delay: Duration,
    pub marek_alloc_mib: usize,
    pub marek_pause: Duration,
    pub viking_extra_reads: i32,
    pub matus_coffee_type: String,
    pub mila_offset_secs: i64,
}

impl DemoConfig {
    pub fn mila_offset(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::seconds(self.mila_offset_secs)
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tom_delay: Duration::from_millis(TOM_DELAY_MS),
            marek_alloc_mib: MAREK_ALLOC_MIB,
            marek_pause: Duration::from_millis(MAREK_PAUSE_MS),
            viking_extra_reads: VIKING_EXTRA_READS,
            matus_coffee_type: MATUS_COFFEE_TYPE.to_string(),
            mila_offset_secs: MILA_OFFSET_SECS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub region: String,
    pub environment: String,
    pub log_format: LogFormat,
    pub error_status_mode: ErrorStatusMode,
    pub database: DatabaseConfig,
    pub telemetry: TelemetryConfig,
    pub metrics: MetricsConfig,
    pub demo: DemoConfig,
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let string_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            host: string_or("DB_HOST", DB_HOST),
            port: parse_or(get("DB_PORT"), DB_PORT),
            name: string_or("DB_NAME", DB_NAME),
            user: string_or("DB_USER", DB_USER),
            password: string_or("DB_PASSWORD", DB_PASSWORD),
            ssl_mode: string_or("DB_SSLMODE", DB_SSL_MODE),
            url_override: get("DATABASE_URL"),
            max_connections: parse_or(get("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
            min_connections: parse_or(get("DB_MIN_CONNECTIONS"), MIN_CONNECTIONS),
            max_lifetime: Duration::from_secs(parse_or(
                get("DB_MAX_LIFETIME_SECS"),
                MAX_LIFETIME_SECS,
            )),
            idle_timeout: Duration::from_secs(parse_or(
                get("DB_IDLE_TIMEOUT_SECS"),
                IDLE_TIMEOUT_SECS,
            )),
            acquire_timeout: Duration::from_secs(parse_or(
                get("DB_ACQUIRE_TIMEOUT_SECS"),
                ACQUIRE_TIMEOUT_SECS,
            )),
        };

        let telemetry = TelemetryConfig {
            enabled: parse_or(get("OTEL_ENABLED").map(|v| v.to_lowercase()), true),
            endpoint: string_or("OTEL_EXPORTER_OTLP_ENDPOINT", OTEL_ENDPOINT),
            protocol: string_or("OTEL_EXPORTER_OTLP_PROTOCOL", OTEL_PROTOCOL).to_lowercase(),
            service_name: string_or("OTEL_SERVICE_NAME", OTEL_SERVICE_NAME),
            service_version: string_or("OTEL_SERVICE_VERSION", env!("CARGO_PKG_VERSION")),
            sampler: string_or("OTEL_SAMPLER", OTEL_SAMPLER).to_lowercase(),
            sample_ratio: parse_or(get("OTEL_SAMPLE_RATIO"), OTEL_SAMPLE_RATIO),
            metrics_interval_secs: parse_or(
                get("OTEL_METRICS_INTERVAL_SECS"),
                OTEL_METRICS_INTERVAL_SECS,
            ),
        };

        let metrics = MetricsConfig {
            backend: parse_or(get("METRICS_BACKEND"), MetricsBackend::Otel),
            namespace: string_or("METRICS_NAMESPACE", METRICS_NAMESPACE),
            workers: parse_or(get("METRICS_WORKERS"), METRICS_WORKERS).max(1),
            queue_capacity: parse_or(get("METRICS_QUEUE_CAPACITY"), METRICS_QUEUE_CAPACITY)
                .max(1),
        };

        let demo = DemoConfig {
            tom_delay: Duration::from_millis(parse_or(get("DEMO_TOM_DELAY_MS"), TOM_DELAY_MS)),
            marek_alloc_mib: parse_or(get("DEMO_MAREK_ALLOC_MIB"), MAREK_ALLOC_MIB),
            marek_pause: Duration::from_millis(parse_or(
                get("DEMO_MAREK_PAUSE_MS"),
                MAREK_PAUSE_MS,
            )),
            viking_extra_reads: parse_or(get("DEMO_VIKING_EXTRA_READS"), VIKING_EXTRA_READS),
            matus_coffee_type: string_or("DEMO_MATUS_COFFEE_TYPE", MATUS_COFFEE_TYPE),
            mila_offset_secs: parse_or(get("DEMO_MILA_OFFSET_SECS"), MILA_OFFSET_SECS),
        };

        Config {
            server_port: parse_or(get("PORT"), SERVER_PORT),
            region: string_or("AWS_REGION", REGION),
            environment: get("ENVIRONMENT")
                .or_else(|| get("APP_ENV"))
                .unwrap_or_else(|| ENVIRONMENT.to_string()),
            log_format: parse_or(get("LOG_FORMAT"), LogFormat::Json),
            error_status_mode: parse_or(get("ERROR_STATUS_MODE"), ErrorStatusMode::Uniform),
            database,
            telemetry,
            metrics,
            demo,
        }
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn database_url(&self) -> String {
        self.database.url()
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

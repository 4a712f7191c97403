//! Error types module
//!
//! Every failure the service can report is an [`AppError`]. The variants form a
//! small taxonomy (bad input, missing row, duplicate, connectivity, query,
//! schema, initialization) and [`ErrorMetadata`] describes how each one is
//! presented over HTTP and at which level it is logged.
//!
//! `From<sqlx::Error>` classifies driver errors into that taxonomy and is gated
//! behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as malformed input
    Debug,
    /// Recoverable issues
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata for error responses
pub trait ErrorMetadata {
    /// HTTP status code when errors are reported with their own status
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g. "NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[cfg(feature = "sqlx")]
    #[error("Connection error: {0}")]
    Connection(#[source] SqlxError),

    #[cfg(feature = "sqlx")]
    #[error("Query error: {0}")]
    Query(#[source] SqlxError),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => AppError::NotFound("row not found".to_string()),
            SqlxError::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Duplicate(db_err.message().to_string())
            }
            SqlxError::Io(_)
            | SqlxError::Tls(_)
            | SqlxError::PoolTimedOut
            | SqlxError::PoolClosed
            | SqlxError::WorkerCrashed => AppError::Connection(err),
            _ => AppError::Query(err),
        }
    }
}

impl AppError {
    /// Short variant name, used as a log/metric dimension
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Duplicate(_) => "Duplicate",
            #[cfg(feature = "sqlx")]
            AppError::Connection(_) => "Connection",
            #[cfg(feature = "sqlx")]
            AppError::Query(_) => "Query",
            AppError::Schema(_) => "Schema",
            AppError::Init(_) => "Init",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Duplicate(_) => 409,
            _ => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Duplicate(_) => "DUPLICATE",
            #[cfg(feature = "sqlx")]
            AppError::Connection(_) => "DATABASE_UNAVAILABLE",
            #[cfg(feature = "sqlx")]
            AppError::Query(_) => "DATABASE_ERROR",
            AppError::Schema(_) => "SCHEMA_ERROR",
            AppError::Init(_) => "INIT_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::BadRequest(_) | AppError::NotFound(_) => LogLevel::Debug,
            AppError::Duplicate(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

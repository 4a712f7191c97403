//! HTTP error responses
//!
//! Handlers turn failures into [`ApiError`] through [`RequestContext::error`],
//! which logs the failure with its correlation ids, marks the request span,
//! counts it and renders the `{error, request_id, timestamp}` body.
//!
//! **Preferred handler pattern:** return `Result<impl IntoResponse, ApiError>`
//! and map store errors with `.map_err(|e| ctx.error("...", e))`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use barista_core::{AppError, ErrorMetadata, ErrorStatusMode, LogLevel};
use barista_infra::{ErrorResponse, MetricPoint};
use opentelemetry::KeyValue;
use serde::de::DeserializeOwned;

use crate::middleware::RequestContext;
use crate::state::AppState;

/// Dimension value for the `ErrorCount` metric
const APPLICATION_ERROR: &str = "application_error";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
    source: AppError,
}

impl ApiError {
    pub(crate) fn report(ctx: &RequestContext, message: &str, error: AppError) -> Self {
        let trace_id = ctx.trace_id().unwrap_or_default();
        match error.log_level() {
            LogLevel::Debug => tracing::debug!(
                request_id = %ctx.request_id,
                trace_id = %trace_id,
                error = %error,
                error_type = error.error_type(),
                method = %ctx.method,
                path = %ctx.path,
                route = ?ctx.route,
                "{}", message
            ),
            LogLevel::Warn => tracing::warn!(
                request_id = %ctx.request_id,
                trace_id = %trace_id,
                error = %error,
                error_type = error.error_type(),
                method = %ctx.method,
                path = %ctx.path,
                route = ?ctx.route,
                "{}", message
            ),
            LogLevel::Error => tracing::error!(
                request_id = %ctx.request_id,
                trace_id = %trace_id,
                error = %error,
                error_type = error.error_type(),
                method = %ctx.method,
                path = %ctx.path,
                route = ?ctx.route,
                "{}", message
            ),
        }

        let span = ctx.span();
        span.record_error(&error);
        span.set_attribute(KeyValue::new("error.type", error.error_type()));
        span.set_attribute(KeyValue::new("error.message", message.to_string()));

        ctx.metrics().emit(vec![MetricPoint::error_count(APPLICATION_ERROR)]);

        let status = match ctx.error_status_mode() {
            ErrorStatusMode::Uniform => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorStatusMode::Typed => StatusCode::from_u16(error.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };

        ApiError {
            status,
            body: ErrorResponse::new(message, ctx.request_id.clone()),
            source: error,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn app_error(&self) -> &AppError {
        &self.source
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// JSON body extractor that reports malformed bodies as "Invalid JSON"
/// through the same error path as handler failures.
///
/// The `Content-Type` header is not checked; any body that deserializes into
/// `T` is accepted.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest<Arc<AppState>> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let ctx = match RequestContext::from_request_parts(&mut parts, state).await {
            Ok(ctx) => ctx,
            Err(never) => match never {},
        };
        let req = Request::from_parts(parts, body);

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            ctx.error("Invalid JSON", AppError::BadRequest(rejection.body_text()))
        })?;

        serde_json::from_slice(&bytes)
            .map(ValidatedJson)
            .map_err(|e| ctx.error("Invalid JSON", AppError::BadRequest(e.to_string())))
    }
}


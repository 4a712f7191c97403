use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use barista_infra::{RequestId, RequestTrace};
use tracing::Instrument;

use super::trace::{remote_addr, user_agent};

/// Log the start and end of every request.
///
/// Runs the rest of the chain inside a `request` span holding `request_id` and
/// `trace_id`, so every event logged by handlers inherits both fields.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let trace_id = request
        .extensions()
        .get::<RequestTrace>()
        .and_then(RequestTrace::trace_id)
        .unwrap_or_default();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        trace_id = %trace_id,
    );

    async move {
        tracing::info!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            remote_addr = %remote_addr(&request),
            user_agent = %user_agent(&request),
            "Request started"
        );

        let started = Instant::now();
        let response = next.run(request).await;
        let status_code = response.status().as_u16();
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        if status_code >= 500 {
            tracing::error!(request_id = %request_id, status_code, duration_ms, "Request completed");
        } else if status_code >= 400 {
            tracing::warn!(request_id = %request_id, status_code, duration_ms, "Request completed");
        } else {
            tracing::info!(request_id = %request_id, status_code, duration_ms, "Request completed");
        }

        response
    }
    .instrument(span)
    .await
}

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use barista_infra::MetricPoint;

use crate::state::AppState;

/// `Endpoint` dimension for requests no route matched
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Enqueue `RequestDuration` and `RequestCount` for every request.
///
/// Dimensions use the route pattern rather than the raw path to keep
/// cardinality bounded.
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    state.metrics.emit(vec![
        MetricPoint::request_duration(&endpoint, started.elapsed()),
        MetricPoint::request_count(&endpoint, response.status().as_u16()),
    ]);

    response
}

//! Health check handler

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::middleware::RequestContext;
use crate::state::AppState;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// `healthy` or `unhealthy`
    pub database: String,
    pub region: String,
}

/// Report service and database health.
///
/// Always answers 200; an unreachable store only shows up in `database`.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> impl IntoResponse {
    let database = match tokio::time::timeout(PING_TIMEOUT, ctx.store(&state).ping()).await {
        Ok(Ok(())) => "healthy",
        Ok(Err(e)) => {
            tracing::error!(
                request_id = %ctx.request_id,
                error = %e,
                "Database health check failed"
            );
            "unhealthy"
        }
        Err(_) => {
            tracing::error!(request_id = %ctx.request_id, "Database health check timed out");
            "unhealthy"
        }
    };

    let span = ctx.span();
    span.set_attribute(KeyValue::new("health.status", "healthy"));
    span.set_attribute(KeyValue::new("health.database", database));

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            database: database.to_string(),
            region: state.region.clone(),
        }),
    )
}

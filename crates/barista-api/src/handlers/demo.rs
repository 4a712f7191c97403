//! Demo endpoints
//!
//! Each handler reproduces one failure mode the observability pipeline is
//! meant to surface: latency, errors, memory pressure, chatty queries,
//! silently rewritten input and clock skew. `slow-query` and `high-cpu`
//! exercise slow database work and CPU-bound work.

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, response::IntoResponse, Json};
use barista_core::{AppError, CoffeeOrder, CreateCoffeeOrder};
use barista_infra::ErrorResponse;
use chrono::Utc;
use opentelemetry::KeyValue;
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{order_created, record_order_request};
use crate::error::{ApiError, ValidatedJson};
use crate::middleware::RequestContext;
use crate::state::AppState;

const MIB: usize = 1024 * 1024;
const SLOW_QUERY_SLEEP: Duration = Duration::from_secs(2);
const HIGH_CPU_ITERATIONS: u32 = 10_000_000;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlowQueryResponse {
    pub message: String,
    pub count: i64,
    /// Human readable elapsed time, e.g. `2.003s`
    pub duration: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HighCpuResponse {
    pub message: String,
    pub duration: String,
}

/// Waits before storing the order.
#[utoipa::path(
    post,
    path = "/make-coffee-tom",
    tag = "demo",
    request_body = CreateCoffeeOrder,
    responses(
        (status = 201, description = "Coffee order created after a delay", body = CoffeeOrder),
        (status = 500, description = "Invalid JSON or store failure", body = ErrorResponse)
    )
)]
pub async fn make_coffee_tom(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ValidatedJson(order): ValidatedJson<CreateCoffeeOrder>,
) -> Result<impl IntoResponse, ApiError> {
    record_order_request(&ctx, &order);
    tokio::time::sleep(state.demo.tom_delay).await;

    let created = ctx
        .store(&state)
        .create_order(&order)
        .await
        .map_err(|e| ctx.error("Failed to create coffee order", e))?;

    Ok(order_created(&ctx, created))
}

/// Always fails, after the body has been decoded. Nothing is stored.
#[utoipa::path(
    post,
    path = "/make-coffee-honza",
    tag = "demo",
    request_body = CreateCoffeeOrder,
    responses(
        (status = 500, description = "Always fails", body = ErrorResponse)
    )
)]
pub async fn make_coffee_honza(
    ctx: RequestContext,
    ValidatedJson(order): ValidatedJson<CreateCoffeeOrder>,
) -> Result<Json<CoffeeOrder>, ApiError> {
    record_order_request(&ctx, &order);

    Err(ctx.error(
        "Honza's endpoint is broken",
        AppError::Internal("intentional failure".to_string()),
    ))
}

/// Allocates and touches a large amount of memory before storing the order.
#[utoipa::path(
    post,
    path = "/make-coffee-marek",
    tag = "demo",
    request_body = CreateCoffeeOrder,
    responses(
        (status = 201, description = "Coffee order created after memory pressure", body = CoffeeOrder),
        (status = 500, description = "Invalid JSON or store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn make_coffee_marek(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ValidatedJson(order): ValidatedJson<CreateCoffeeOrder>,
) -> Result<impl IntoResponse, ApiError> {
    record_order_request(&ctx, &order);

    let chunks: Vec<Vec<u8>> = (0..state.demo.marek_alloc_mib)
        .map(|_| black_box(vec![1u8; MIB]))
        .collect();
    let held: usize = chunks.iter().map(Vec::len).sum();
    tracing::debug!(held_bytes = held, "Memory allocated");

    tokio::time::sleep(state.demo.marek_pause).await;
    drop(black_box(chunks));

    let created = ctx
        .store(&state)
        .create_order(&order)
        .await
        .map_err(|e| ctx.error("Failed to create coffee order", e))?;

    Ok(order_created(&ctx, created))
}

/// Issues a burst of throwaway lookups before storing the order.
#[utoipa::path(
    post,
    path = "/make-coffee-viking",
    tag = "demo",
    request_body = CreateCoffeeOrder,
    responses(
        (status = 201, description = "Coffee order created after extra reads", body = CoffeeOrder),
        (status = 500, description = "Invalid JSON or store failure", body = ErrorResponse)
    )
)]
pub async fn make_coffee_viking(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ValidatedJson(order): ValidatedJson<CreateCoffeeOrder>,
) -> Result<impl IntoResponse, ApiError> {
    record_order_request(&ctx, &order);
    let store = ctx.store(&state);

    // Results are irrelevant; missing rows are expected.
    for id in 0..state.demo.viking_extra_reads {
        let _ = store.get_order(id).await;
    }

    let created = store
        .create_order(&order)
        .await
        .map_err(|e| ctx.error("Failed to create coffee order", e))?;

    Ok(order_created(&ctx, created))
}

/// Stores the order with its coffee type replaced.
#[utoipa::path(
    post,
    path = "/make-coffee-matus",
    tag = "demo",
    request_body = CreateCoffeeOrder,
    responses(
        (status = 201, description = "Coffee order created with a substituted coffee type", body = CoffeeOrder),
        (status = 500, description = "Invalid JSON or store failure", body = ErrorResponse)
    )
)]
pub async fn make_coffee_matus(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ValidatedJson(mut order): ValidatedJson<CreateCoffeeOrder>,
) -> Result<impl IntoResponse, ApiError> {
    record_order_request(&ctx, &order);
    order.coffee_type = state.demo.matus_coffee_type.clone();
    ctx.span().set_attribute(KeyValue::new(
        "coffee_order.coffee_type_override",
        order.coffee_type.clone(),
    ));

    let created = ctx
        .store(&state)
        .create_order(&order)
        .await
        .map_err(|e| ctx.error("Failed to create coffee order", e))?;

    Ok(order_created(&ctx, created))
}

/// Stores the order with a creation time in the future.
#[utoipa::path(
    post,
    path = "/make-coffee-mila",
    tag = "demo",
    request_body = CreateCoffeeOrder,
    responses(
        (status = 201, description = "Coffee order created with a skewed timestamp", body = CoffeeOrder),
        (status = 500, description = "Invalid JSON or store failure", body = ErrorResponse)
    )
)]
pub async fn make_coffee_mila(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ValidatedJson(order): ValidatedJson<CreateCoffeeOrder>,
) -> Result<impl IntoResponse, ApiError> {
    record_order_request(&ctx, &order);
    let created_at = Utc::now() + state.demo.mila_offset();

    let created = ctx
        .store(&state)
        .create_order_at(&order, created_at)
        .await
        .map_err(|e| ctx.error("Failed to create coffee order", e))?;

    Ok(order_created(&ctx, created))
}

#[utoipa::path(
    get,
    path = "/demo/slow-query",
    tag = "demo",
    responses(
        (status = 200, description = "Slow query finished", body = SlowQueryResponse),
        (status = 500, description = "Query failed", body = ErrorResponse)
    )
)]
pub async fn slow_query(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<SlowQueryResponse>, ApiError> {
    let started = Instant::now();
    let count = ctx
        .store(&state)
        .slow_count(SLOW_QUERY_SLEEP)
        .await
        .map_err(|e| ctx.error("Slow query failed", e))?;

    Ok(Json(SlowQueryResponse {
        message: "Slow query completed".to_string(),
        count,
        duration: format!("{:?}", started.elapsed()),
    }))
}

#[utoipa::path(
    get,
    path = "/demo/high-cpu",
    tag = "demo",
    responses(
        (status = 200, description = "CPU-bound work finished", body = HighCpuResponse),
        (status = 500, description = "Worker failed", body = ErrorResponse)
    )
)]
pub async fn high_cpu(ctx: RequestContext) -> Result<Json<HighCpuResponse>, ApiError> {
    let started = Instant::now();

    let sum = tokio::task::spawn_blocking(|| {
        let mut rng = rand::rng();
        (0..HIGH_CPU_ITERATIONS).fold(0u64, |acc, _| {
            acc.wrapping_add(u64::from(rng.random::<u32>()))
        })
    })
    .await
    .map_err(|e| ctx.error("CPU intensive task failed", AppError::Internal(e.to_string())))?;
    black_box(sum);

    Ok(Json(HighCpuResponse {
        message: "CPU intensive task completed".to_string(),
        duration: format!("{:?}", started.elapsed()),
    }))
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use barista_core::{AppError, CoffeeOrder, CreateCoffeeOrder};
use barista_infra::ErrorResponse;

use super::{order_created, record_order_request};
use crate::error::{ApiError, ValidatedJson};
use crate::middleware::RequestContext;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/coffee/{id}",
    tag = "coffee",
    params(
        ("id" = i32, Path, description = "Coffee order ID")
    ),
    responses(
        (status = 200, description = "Coffee order", body = CoffeeOrder),
        (status = 500, description = "Invalid ID, order not found or query failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx), fields(request_id = %ctx.request_id))]
pub async fn get_coffee_order(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<CoffeeOrder>, ApiError> {
    let id: i32 = id.parse().map_err(|_| {
        ctx.error(
            "Invalid coffee order ID",
            AppError::BadRequest(format!("'{}' is not a valid order id", id)),
        )
    })?;

    let order = ctx
        .store(&state)
        .get_order(id)
        .await
        .map_err(|e| ctx.error("Failed to get coffee order", e))?;

    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/coffee",
    tag = "coffee",
    request_body = CreateCoffeeOrder,
    responses(
        (status = 201, description = "Coffee order created", body = CoffeeOrder),
        (status = 500, description = "Invalid JSON or store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, order), fields(request_id = %ctx.request_id))]
pub async fn create_coffee_order(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ValidatedJson(order): ValidatedJson<CreateCoffeeOrder>,
) -> Result<impl IntoResponse, ApiError> {
    record_order_request(&ctx, &order);

    let created = ctx
        .store(&state)
        .create_order(&order)
        .await
        .map_err(|e| ctx.error("Failed to create coffee order", e))?;

    Ok(order_created(&ctx, created))
}

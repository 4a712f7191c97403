pub mod demo;
pub mod health;
pub mod orders;

use axum::{http::StatusCode, response::IntoResponse, Json};
use barista_core::{CoffeeOrder, CreateCoffeeOrder};
use barista_infra::{ErrorResponse, MetricPoint};
use opentelemetry::KeyValue;

use crate::middleware::RequestContext;

/// Tag the request span with the order being placed.
pub(crate) fn record_order_request(ctx: &RequestContext, order: &CreateCoffeeOrder) {
    let span = ctx.span();
    span.set_attribute(KeyValue::new(
        "coffee_order.user_name",
        order.user_name.clone(),
    ));
    span.set_attribute(KeyValue::new(
        "coffee_order.coffee_type",
        order.coffee_type.clone(),
    ));
}

/// 201 response for a freshly stored order; counts it as `CreatedCoffeeOrders`.
pub(crate) fn order_created(ctx: &RequestContext, order: CoffeeOrder) -> impl IntoResponse {
    ctx.span()
        .set_attribute(KeyValue::new("coffee_order.id", i64::from(order.id)));
    ctx.metrics().emit(vec![MetricPoint::orders_created(
        &order.user_name,
        &order.coffee_type,
    )]);

    tracing::info!(
        request_id = %ctx.request_id,
        order_id = order.id,
        user_name = %order.user_name,
        coffee_type = %order.coffee_type,
        "Coffee order created"
    );

    (StatusCode::CREATED, Json(order))
}

/// Fallback for unmatched routes
pub async fn not_found(ctx: RequestContext) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Not found", ctx.request_id)),
    )
}

//! Route table

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::handlers::{demo, health, not_found, orders};
use crate::middleware::apply_pipeline;
use crate::state::AppState;

/// All application routes, without middleware
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/coffee/{id}", get(orders::get_coffee_order))
        .route("/coffee", post(orders::create_coffee_order))
        .route("/make-coffee-tom", post(demo::make_coffee_tom))
        .route("/make-coffee-honza", post(demo::make_coffee_honza))
        .route("/make-coffee-marek", post(demo::make_coffee_marek))
        .route("/make-coffee-viking", post(demo::make_coffee_viking))
        .route("/make-coffee-matus", post(demo::make_coffee_matus))
        .route("/make-coffee-mila", post(demo::make_coffee_mila))
        .route("/demo/slow-query", get(demo::slow_query))
        .route("/demo/high-cpu", get(demo::high_cpu))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        // Before the layers, so unmatched requests also pass through the pipeline
        .fallback(not_found)
}

/// Application routes and the API docs viewer, wrapped in the observability
/// pipeline
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = api_routes()
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"));
    apply_pipeline(routes, state)
}

//! OpenAPI documentation, served at `/api/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::handlers;
use barista_core::models;
use barista_infra::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Barista API",
        version = "0.1.0",
        description = "Coffee order demo service. Every request is traced, logged and counted; the /make-coffee-* and /demo/* endpoints each misbehave in a distinct way."
    ),
    paths(
        handlers::health::health_check,
        handlers::orders::get_coffee_order,
        handlers::orders::create_coffee_order,
        handlers::demo::make_coffee_tom,
        handlers::demo::make_coffee_honza,
        handlers::demo::make_coffee_marek,
        handlers::demo::make_coffee_viking,
        handlers::demo::make_coffee_matus,
        handlers::demo::make_coffee_mila,
        handlers::demo::slow_query,
        handlers::demo::high_cpu,
    ),
    components(
        schemas(
            models::CoffeeOrder,
            models::CreateCoffeeOrder,
            ErrorResponse,
            handlers::health::HealthResponse,
            handlers::demo::SlowQueryResponse,
            handlers::demo::HighCpuResponse,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "coffee", description = "Coffee orders"),
        (name = "demo", description = "Endpoints with deliberate latency, errors and resource usage")
    )
)]
pub struct ApiDoc;

//! Request-observability middleware chain
//!
//! Stages, outermost first:
//!
//! 1. recovery: a panic anywhere inside becomes a JSON 500
//! 2. request id: reuse `X-Request-ID` or mint one
//! 3. trace span: `"<METHOD> <path>"` server span, child of any inbound context
//! 4. logging: "Request started" / "Request completed" inside a span carrying
//!    the request and trace ids
//! 5. metrics: `RequestDuration` and `RequestCount` per matched route
//! 6. response headers: `X-Request-ID` and `X-Trace-ID`
//!
//! Each stage reads the final response status, so all of them agree on what a
//! request returned. Panic responses bypass stages 2-6 because those futures
//! unwind; such responses carry no correlation headers.

mod context;
mod headers;
mod logging;
mod metrics;
mod recovery;
mod trace;

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use barista_infra::request_id_middleware;
use tower_http::catch_panic::CatchPanicLayer;

use crate::state::AppState;

pub use context::RequestContext;
pub use headers::{response_headers_middleware, TRACE_ID_HEADER};
pub use logging::logging_middleware;
pub use metrics::{metrics_middleware, UNMATCHED_ROUTE};
pub use recovery::handle_panic;
pub use trace::trace_middleware;

/// Wrap every route (and the fallback) of `router` in the middleware chain.
///
/// The last `.layer` call is the outermost stage.
pub fn apply_pipeline(router: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    router
        .layer(from_fn(response_headers_middleware))
        .layer(from_fn_with_state(state.clone(), metrics_middleware))
        .layer(from_fn(logging_middleware))
        .layer(from_fn_with_state(state.clone(), trace_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

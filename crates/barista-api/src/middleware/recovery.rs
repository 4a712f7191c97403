//! Panic recovery, the outermost pipeline stage
//!
//! A panic unwinds every inner stage before it reaches this one, so the log
//! line and the 500 body carry no request id and the response has no
//! correlation headers.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use barista_infra::ErrorResponse;

/// Turn a caught panic into a JSON 500.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %details, "Recovered from panic while handling request");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "")),
    )
        .into_response()
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};
use barista_infra::{RequestId, RequestTrace};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt};
use opentelemetry::KeyValue;

use crate::state::AppState;

/// Start the request's server span and finish it with the response status.
pub async fn trace_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let parent = state.tracing.extract(request.headers());

    let method = request.method().to_string();
    let span_name = format!("{} {}", method, request.uri().path());
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let mut attributes = vec![
        KeyValue::new("http.method", method),
        KeyValue::new("http.url", request.uri().to_string()),
        KeyValue::new("http.user_agent", user_agent(&request)),
        KeyValue::new("http.remote_addr", remote_addr(&request)),
        KeyValue::new("request.id", request_id),
    ];
    if let Some(route) = request.extensions().get::<MatchedPath>() {
        attributes.push(KeyValue::new("http.route", route.as_str().to_string()));
    }

    let cx = state
        .tracing
        .start(span_name, SpanKind::Server, &parent, attributes);
    request.extensions_mut().insert(RequestTrace(cx.clone()));

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let span = cx.span();
    span.set_attribute(KeyValue::new("http.status_code", i64::from(status)));
    if status >= 400 {
        span.set_status(Status::error(format!("HTTP {}", status)));
    } else {
        span.set_status(Status::Ok);
    }
    span.end();

    response
}

pub(super) fn user_agent(request: &Request) -> String {
    request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub(super) fn remote_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

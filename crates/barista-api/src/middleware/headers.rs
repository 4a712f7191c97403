use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use barista_infra::{RequestId, RequestTrace, REQUEST_ID_HEADER};

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Copy the correlation ids onto the response.
pub async fn response_headers_middleware(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().cloned();
    let trace_id = request
        .extensions()
        .get::<RequestTrace>()
        .and_then(RequestTrace::trace_id);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id.as_str()).ok()) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    if let Some(value) = trace_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        headers.insert(HeaderName::from_static(TRACE_ID_HEADER), value);
    }

    response
}

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, MatchedPath},
    http::{request::Parts, Method},
};
use barista_core::{AppError, ErrorStatusMode};
use barista_infra::{trace_id, MetricsEmitter, RequestId, RequestTrace};
use opentelemetry::trace::{SpanRef, TraceContextExt};
use opentelemetry::Context;

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::TracedStore;

/// Per-request correlation data, assembled from what the pipeline stages
/// left in the request extensions.
///
/// Lives for one request only; handlers receive it as an extractor.
#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub trace: Context,
    pub method: Method,
    pub path: String,
    /// Route pattern such as `/coffee/{id}`; `None` for unmatched requests
    pub route: Option<String>,
    metrics: Arc<MetricsEmitter>,
    error_status_mode: ErrorStatusMode,
}

impl RequestContext {
    pub fn trace_id(&self) -> Option<String> {
        trace_id(&self.trace)
    }

    /// The request's server span
    pub fn span(&self) -> SpanRef<'_> {
        self.trace.span()
    }

    /// Report a handler failure and build the response for it.
    pub fn error(&self, message: &str, error: AppError) -> ApiError {
        ApiError::report(self, message, error)
    }

    pub(crate) fn metrics(&self) -> &MetricsEmitter {
        &self.metrics
    }

    pub(crate) fn error_status_mode(&self) -> ErrorStatusMode {
        self.error_status_mode
    }

    /// Store handle whose calls show up as child spans of this request
    pub(crate) fn store<'a>(&'a self, state: &'a AppState) -> TracedStore<'a> {
        TracedStore::new(state.store.as_ref(), &state.tracing, &self.trace)
    }
}

impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();
        let trace = parts
            .extensions
            .get::<RequestTrace>()
            .map(|t| t.0.clone())
            .unwrap_or_default();
        let route = parts
            .extensions
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string());

        Ok(RequestContext {
            request_id,
            trace,
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            route,
            metrics: state.metrics.clone(),
            error_status_mode: state.error_status_mode,
        })
    }
}

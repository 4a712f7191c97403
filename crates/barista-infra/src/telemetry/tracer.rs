use std::borrow::Cow;
use std::sync::Arc;

use http::HeaderMap;
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Tracer, TracerProvider};

/// Handle for starting spans and moving trace context across HTTP headers.
///
/// Cheap to clone; every clone shares the same tracer and propagator.
#[derive(Clone)]
pub struct Tracing {
    tracer: Tracer,
    propagator: Arc<TextMapCompositePropagator>,
}

impl Tracing {
    pub fn new(provider: &TracerProvider, instrumentation_name: impl Into<String>) -> Self {
        let propagator = TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]);

        Self {
            tracer: provider.tracer(instrumentation_name.into()),
            propagator: Arc::new(propagator),
        }
    }

    /// Parent context carried by inbound `traceparent`/`baggage` headers.
    /// Returns an empty context when the headers are absent or malformed.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract(&HeaderExtractor(headers))
    }

    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator.inject_context(cx, &mut HeaderInjector(headers));
    }

    /// Start a span as a child of `parent` and return the context holding it.
    /// The span ends when `cx.span().end()` is called or the last clone of the
    /// context is dropped.
    pub fn start(
        &self,
        name: impl Into<Cow<'static, str>>,
        kind: SpanKind,
        parent: &Context,
        attributes: Vec<KeyValue>,
    ) -> Context {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .with_attributes(attributes)
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }
}

/// Trace context of the request being served, stored as a request extension
#[derive(Clone, Debug)]
pub struct RequestTrace(pub Context);

impl RequestTrace {
    pub fn trace_id(&self) -> Option<String> {
        trace_id(&self.0)
    }
}

/// Hex trace id of the active span, if it carries a valid one
pub fn trace_id(cx: &Context) -> Option<String> {
    let span = cx.span();
    let span_context = span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;

    fn tracing_with_exporter() -> (Tracing, InMemorySpanExporter, TracerProvider) {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (Tracing::new(&provider, "barista-test"), exporter, provider)
    }

    #[test]
    fn inbound_traceparent_becomes_parent() {
        let (tracing, exporter, _provider) = tracing_with_exporter();
        let mut headers = HeaderMap::new();
        headers.insert(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
                .parse()
                .unwrap(),
        );

        let parent = tracing.extract(&headers);
        let cx = tracing.start("GET /health", SpanKind::Server, &parent, vec![]);
        assert_eq!(
            trace_id(&cx).as_deref(),
            Some("4bf92f3577b34da6a3ce929d0e0e4736")
        );
        cx.span().end();

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(
            spans[0].parent_span_id,
            SpanId::from_hex("00f067aa0ba902b7").unwrap()
        );
    }

    #[test]
    fn missing_headers_start_a_new_trace() {
        let (tracing, _exporter, _provider) = tracing_with_exporter();
        let parent = tracing.extract(&HeaderMap::new());
        assert!(trace_id(&parent).is_none());

        let cx = tracing.start("POST /coffee", SpanKind::Server, &parent, vec![]);
        let id = trace_id(&cx).unwrap();
        assert_eq!(id.len(), 32);
    }

    #[test]
    fn inject_round_trips_context() {
        let (tracing, _exporter, _provider) = tracing_with_exporter();
        let remote = SpanContext::new(
            TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap(),
            SpanId::from_hex("b7ad6b7169203331").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        let cx = Context::new().with_remote_span_context(remote);

        let mut headers = HeaderMap::new();
        tracing.inject(&cx, &mut headers);
        let extracted = tracing.extract(&headers);
        assert_eq!(
            trace_id(&extracted).as_deref(),
            Some("0af7651916cd43dd8448eb211c80319c")
        );
    }
}

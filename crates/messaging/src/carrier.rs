//! W3C trace-context propagation through message headers.
//!
//! The producer injects the context of the current `tracing` span as a
//! `traceparent` header and the consumer parents its processing span on the
//! extracted context, so both sides of the log share one trace id.

use opentelemetry::Context;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{SpanContext, TraceContextExt, TraceFlags, TraceId, TraceState};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{IdGenerator, RandomIdGenerator};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::Headers;

/// Header name defined by the W3C Trace Context recommendation.
pub const TRACEPARENT_HEADER: &str = "traceparent";

struct HeaderInjector<'a>(&'a mut Headers);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        self.0.insert(key.to_string(), value);
    }
}

struct HeaderExtractor<'a>(&'a Headers);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

/// Writes `cx` into message headers. Contexts without a valid span write nothing.
pub fn inject(cx: &Context, headers: &mut Headers) {
    TraceContextPropagator::new().inject_context(cx, &mut HeaderInjector(headers));
}

/// Reads a context from message headers; missing or malformed headers give
/// an empty context.
pub fn extract(headers: &Headers) -> Context {
    TraceContextPropagator::new().extract(&HeaderExtractor(headers))
}

/// Context of the current `tracing` span.
///
/// Without an OpenTelemetry layer on the subscriber the span carries no ids;
/// a fresh sampled root is started instead so every message stays traceable.
pub fn current_context() -> Context {
    let cx = tracing::Span::current().context();
    if cx.span().span_context().is_valid() {
        cx
    } else {
        new_root()
    }
}

/// Trace id of `cx`, if it carries a valid span context.
pub fn trace_id(cx: &Context) -> Option<TraceId> {
    let span = cx.span();
    let span_context = span.span_context();
    span_context.is_valid().then(|| span_context.trace_id())
}

fn new_root() -> Context {
    let ids = RandomIdGenerator::default();
    Context::new().with_remote_span_context(SpanContext::new(
        ids.new_trace_id(),
        ids.new_span_id(),
        TraceFlags::SAMPLED,
        false,
        TraceState::default(),
    ))
}

#[cfg(test)]
mod tests {
    use opentelemetry::trace::TracerProvider;
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    const KNOWN: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn headers_with(value: &str) -> Headers {
        let mut headers = Headers::new();
        headers.insert(TRACEPARENT_HEADER.to_string(), value.to_string());
        headers
    }

    #[test]
    fn test_extract_then_inject_keeps_value() {
        let cx = extract(&headers_with(KNOWN));
        assert_eq!(
            trace_id(&cx).unwrap().to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );

        let mut headers = Headers::new();
        inject(&cx, &mut headers);
        assert_eq!(headers[TRACEPARENT_HEADER], KNOWN);
    }

    #[test]
    fn test_malformed_header_gives_empty_context() {
        for value in [
            "garbage",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
        ] {
            assert!(trace_id(&extract(&headers_with(value))).is_none(), "{value}");
        }
        assert!(trace_id(&extract(&Headers::new())).is_none());

        let mut headers = Headers::new();
        inject(&Context::new(), &mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_current_context_without_otel_layer_starts_root() {
        let cx = current_context();
        assert!(trace_id(&cx).is_some());
        assert_ne!(trace_id(&current_context()), trace_id(&cx));
    }

    #[test]
    fn test_current_context_follows_active_span() {
        let provider = SdkTracerProvider::builder().build();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("test")));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("publish");
            let expected = trace_id(&span.context()).unwrap();

            let _entered = span.enter();
            let mut headers = Headers::new();
            inject(&current_context(), &mut headers);

            assert_eq!(trace_id(&extract(&headers)), Some(expected));
        });
    }
}

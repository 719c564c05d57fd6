//! Explicit tracing context
//!
//! Holds the tracer and the text-map propagator the probe uses. It is passed
//! to the components that create spans instead of living in process-wide
//! globals, so tests can build one around an in-memory exporter.

use std::sync::{Arc, LazyLock};

use opentelemetry::{
    Context,
    propagation::{TextMapCompositePropagator, TextMapPropagator},
    trace::TracerProvider as _,
};
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_sdk::{
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::{SdkTracer, SdkTracerProvider},
};
use reqwest::header::HeaderMap;

/// Build the W3C trace-context + baggage propagator
#[must_use]
pub fn composite_propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

static PROPAGATOR: LazyLock<TextMapCompositePropagator> = LazyLock::new(composite_propagator);

/// Read a remote span context and baggage from incoming `headers`
#[must_use]
pub fn extract_context(headers: &HeaderMap) -> Context {
    PROPAGATOR.extract(&HeaderExtractor(headers))
}

/// Tracer and propagator shared by everything that emits spans
#[derive(Clone)]
pub struct TracingContext {
    tracer: SdkTracer,
    propagator: Arc<TextMapCompositePropagator>,
}

impl std::fmt::Debug for TracingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracingContext")
            .field("scope", &Self::INSTRUMENTATION_SCOPE)
            .field("fields", &self.propagator.fields().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TracingContext {
    /// Instrumentation scope reported on every span
    pub const INSTRUMENTATION_SCOPE: &'static str = "otelcurl/client";

    /// Create a context backed by `provider`
    #[must_use]
    pub fn new(provider: &SdkTracerProvider) -> Self {
        Self {
            tracer: provider.tracer(Self::INSTRUMENTATION_SCOPE),
            propagator: Arc::new(composite_propagator()),
        }
    }

    /// Tracer spans are created with
    #[must_use]
    pub const fn tracer(&self) -> &SdkTracer {
        &self.tracer
    }

    /// Write the span context and baggage of `cx` into `headers`
    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator
            .inject_context(cx, &mut HeaderInjector(headers));
    }
}

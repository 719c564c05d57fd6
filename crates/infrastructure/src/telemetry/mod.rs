//! Telemetry and distributed tracing infrastructure
//!
//! Connects to an OTLP collector, builds the tracer provider and propagator,
//! and sets up console logging.

mod context;
mod logging;
mod otel;

pub use context::{TracingContext, composite_propagator, extract_context};
pub use logging::{LogConfig, LogFormat, init_logging};
pub use otel::{
    COLLECTOR_ENDPOINT_ENV, TelemetryConfig, TelemetryError, TelemetryGuard, collector_uri,
    connect_collector, init_tracer,
};

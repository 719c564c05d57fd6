//! Infrastructure layer - Adapters for external systems
//!
//! Implements the probe port on top of a trace-propagating HTTP client and
//! wires up the OpenTelemetry pipeline that exports its spans.

pub mod adapters;
pub mod config;
pub mod errors;
pub mod http;
pub mod telemetry;

pub use adapters::{HttpProbeAdapter, ProbeAdapterConfig};
pub use config::{AppConfig, ProbeConfig};
pub use errors::error_chain;
pub use http::{HttpError, TracedClientConfig, TracedHttpClient, TracedResponse};
pub use telemetry::{
    LogConfig, LogFormat, TelemetryConfig, TelemetryError, TelemetryGuard, TracingContext,
    init_logging, init_tracer,
};

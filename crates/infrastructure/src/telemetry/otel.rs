//! OpenTelemetry initialization and configuration
//!
//! Provides tracing pipeline setup for exporting spans to an OTLP collector
//! over gRPC. Unlike a long-running service, the probe has no degraded mode:
//! if the collector cannot be reached the pipeline is not built at all.

use std::time::Duration;

use opentelemetry_otlp::{SpanExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{Sampler, SdkTracerProvider},
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use super::context::TracingContext;
use crate::errors::error_chain;

/// Environment variable holding the collector address
pub const COLLECTOR_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Pause between two refused connection attempts
const CONNECT_RETRY_PAUSE: Duration = Duration::from_millis(100);

/// Configuration for telemetry/tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Collector address, `host:port` or `http://host:port`
    #[serde(default = "default_collector_endpoint")]
    pub collector_endpoint: String,

    /// Service name for traces
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// How long to keep trying to reach the collector at startup, in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Timeout for a single batch export, in seconds
    #[serde(default = "default_export_timeout")]
    pub export_timeout_secs: u64,
}

fn default_collector_endpoint() -> String {
    "localhost:4317".to_string()
}

fn default_service_name() -> String {
    "otelcurl".to_string()
}

const fn default_connect_timeout() -> u64 {
    1000
}

const fn default_export_timeout() -> u64 {
    10
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            collector_endpoint: default_collector_endpoint(),
            service_name: default_service_name(),
            connect_timeout_ms: default_connect_timeout(),
            export_timeout_secs: default_export_timeout(),
        }
    }
}

impl TelemetryConfig {
    /// Connection timeout as a `Duration`
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Export timeout as a `Duration`
    #[must_use]
    pub const fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }
}

/// Guard that shuts down the tracer provider when dropped
///
/// Shutting down flushes every span still buffered by the batch processor.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("active", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl TelemetryGuard {
    /// Take ownership of a provider so it gets shut down with the guard
    #[must_use]
    pub const fn from_provider(provider: SdkTracerProvider) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Flush pending spans and shut the provider down
    ///
    /// # Errors
    ///
    /// Returns an error if the provider reports a failed shutdown, typically
    /// because the final export did not reach the collector.
    pub fn shutdown(mut self) -> Result<(), TelemetryError> {
        match self.provider.take() {
            Some(provider) => provider
                .shutdown()
                .map_err(|e| TelemetryError::Shutdown(e.to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::error!("Failed to shutdown tracer provider: {:?}", e);
            }
        }
    }
}

/// Turn a collector address into a URI tonic can dial
///
/// A bare `host:port` is dialed over plaintext HTTP/2.
#[must_use]
pub fn collector_uri(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

/// Open a gRPC channel to the collector, retrying until `timeout` elapses
///
/// Mirrors a blocking dial: refused connections are retried until the
/// deadline, and the call only returns once the channel is connected or
/// the deadline has passed.
pub async fn connect_collector(
    endpoint: &str,
    timeout: Duration,
) -> Result<Channel, TelemetryError> {
    let uri = collector_uri(endpoint);
    if uri.starts_with("https://") {
        return Err(TelemetryError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "TLS connections to the collector are not supported".to_string(),
        });
    }

    let target = Endpoint::from_shared(uri.clone())
        .map_err(|e| TelemetryError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: error_chain(&e),
        })?
        .connect_timeout(timeout);

    let deadline = Instant::now() + timeout;
    let mut last_error = format!("timed out after {timeout:?}");

    loop {
        match tokio::time::timeout_at(deadline, target.connect()).await {
            Ok(Ok(channel)) => {
                debug!(collector = %uri, "Connected to collector");
                return Ok(channel);
            },
            Ok(Err(e)) => {
                last_error = error_chain(&e);
                debug!(collector = %uri, error = %last_error, "Collector connection attempt failed");
            },
            Err(_) => {
                last_error = format!("timed out after {timeout:?}");
                break;
            },
        }
        if Instant::now() + CONNECT_RETRY_PAUSE >= deadline {
            break;
        }
        tokio::time::sleep(CONNECT_RETRY_PAUSE).await;
    }

    Err(TelemetryError::Connect {
        endpoint: uri,
        reason: last_error,
    })
}

/// Initialize the tracing pipeline
///
/// Connects to the collector, builds an OTLP/gRPC span exporter on that
/// connection, and installs it behind a batch processor in a provider that
/// samples every trace. Nothing is registered globally: the returned
/// [`TracingContext`] must be handed to whatever creates spans, and the
/// [`TelemetryGuard`] must be kept alive until the process exits.
///
/// # Example
///
/// ```ignore
/// use infrastructure::telemetry::{TelemetryConfig, init_tracer};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let (guard, tracing) = init_tracer(&TelemetryConfig::default()).await?;
///     // Hand `tracing` to the probe adapter...
///     guard.shutdown()?;
///     Ok(())
/// }
/// ```
pub async fn init_tracer(
    config: &TelemetryConfig,
) -> Result<(TelemetryGuard, TracingContext), TelemetryError> {
    let channel = connect_collector(&config.collector_endpoint, config.connect_timeout()).await?;

    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_channel(channel)
        .with_timeout(config.export_timeout())
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .build();

    let provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let context = TracingContext::new(&provider);

    info!(
        collector = %collector_uri(&config.collector_endpoint),
        service = %config.service_name,
        "Telemetry initialized with OTLP export"
    );

    Ok((TelemetryGuard::from_provider(provider), context))
}

/// Error type for telemetry initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize the log subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),

    /// Collector address cannot be dialed
    #[error("Invalid collector endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Collector did not accept a connection before the deadline
    #[error("Failed to create gRPC connection to collector at {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    /// Failed to create OTLP exporter
    #[error("Failed to create trace exporter: {0}")]
    Exporter(String),

    /// Provider shutdown reported an error
    #[error("Failed to shut down tracer provider: {0}")]
    Shutdown(String),
}

#[cfg(test)]
mod tests {
    use opentelemetry::trace::{Span as _, Tracer as _};
    use opentelemetry_sdk::trace::InMemorySpanExporterBuilder;
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn test_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.collector_endpoint, "localhost:4317");
        assert_eq!(config.service_name, "otelcurl");
        assert_eq!(config.connect_timeout(), Duration::from_secs(1));
        assert_eq!(config.export_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_serialization() {
        let config = TelemetryConfig {
            collector_endpoint: "collector:4317".to_string(),
            service_name: "probe".to_string(),
            connect_timeout_ms: 250,
            export_timeout_secs: 3,
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: TelemetryConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.collector_endpoint, "collector:4317");
        assert_eq!(parsed.service_name, "probe");
        assert_eq!(parsed.connect_timeout_ms, 250);
        assert_eq!(parsed.export_timeout_secs, 3);
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let parsed: TelemetryConfig =
            serde_json::from_str(r#"{"collector_endpoint": "otel:4317"}"#).unwrap();
        assert_eq!(parsed.collector_endpoint, "otel:4317");
        assert_eq!(parsed.service_name, "otelcurl");
        assert_eq!(parsed.connect_timeout_ms, 1000);
    }

    #[test]
    fn collector_uri_adds_scheme() {
        assert_eq!(collector_uri("localhost:4317"), "http://localhost:4317");
        assert_eq!(collector_uri(" otel:4317 "), "http://otel:4317");
    }

    #[test]
    fn collector_uri_keeps_explicit_scheme() {
        assert_eq!(collector_uri("http://tempo:4317"), "http://tempo:4317");
        assert_eq!(collector_uri("https://tempo:4317"), "https://tempo:4317");
    }

    #[tokio::test]
    async fn connect_rejects_tls_endpoint() {
        let result = connect_collector("https://tempo:4317", Duration::from_millis(50)).await;
        assert!(matches!(result, Err(TelemetryError::InvalidEndpoint { .. })));
    }

    #[tokio::test]
    async fn connect_rejects_malformed_endpoint() {
        let result = connect_collector("not a uri", Duration::from_millis(50)).await;
        assert!(matches!(result, Err(TelemetryError::InvalidEndpoint { .. })));
    }

    #[tokio::test]
    async fn connect_fails_after_timeout_when_nothing_listens() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let timeout = Duration::from_millis(300);

        let started = std::time::Instant::now();
        let result = connect_collector(&format!("127.0.0.1:{port}"), timeout).await;
        let elapsed = started.elapsed();

        match result {
            Err(TelemetryError::Connect { endpoint, .. }) => {
                assert_eq!(endpoint, format!("http://127.0.0.1:{port}"));
            },
            other => panic!("Expected Connect error, got: {other:?}"),
        }
        assert!(elapsed < timeout + Duration::from_secs(2));
    }

    #[tokio::test]
    async fn init_tracer_fails_without_collector() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = TelemetryConfig {
            collector_endpoint: format!("127.0.0.1:{port}"),
            connect_timeout_ms: 200,
            ..Default::default()
        };

        let result = init_tracer(&config).await;
        assert!(matches!(result, Err(TelemetryError::Connect { .. })));
    }

    #[test]
    fn connect_error_message_names_collector() {
        let err = TelemetryError::Connect {
            endpoint: "http://localhost:4317".to_string(),
            reason: "timed out after 1s".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create gRPC connection to collector at http://localhost:4317: timed out after 1s"
        );
    }

    #[test]
    fn test_telemetry_guard_shutdown_flushes_batched_spans() {
        let exporter = InMemorySpanExporterBuilder::new()
            .keep_records_on_shutdown()
            .build();
        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter.clone())
            .build();
        let tracing = TracingContext::new(&provider);
        tracing.tracer().start("buffered").end();

        let guard = TelemetryGuard::from_provider(provider);
        assert!(format!("{guard:?}").contains("active: true"));
        assert!(guard.shutdown().is_ok());

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "buffered");
    }

    /// Accept connections on `listener` until the test ends
    fn serve_forever(listener: TcpListener) {
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                open.push(stream);
            }
        });
    }

    #[tokio::test]
    async fn connect_succeeds_when_collector_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        serve_forever(listener);

        let result = connect_collector(&format!("127.0.0.1:{port}"), Duration::from_secs(1)).await;
        assert!(result.is_ok(), "Expected connection, got: {result:?}");
    }

    #[tokio::test]
    async fn connect_retries_until_late_collector_comes_up() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
            serve_forever(listener);
        });

        let started = std::time::Instant::now();
        let result = connect_collector(&format!("127.0.0.1:{port}"), Duration::from_secs(3)).await;

        assert!(result.is_ok(), "Expected connection, got: {result:?}");
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn init_tracer_succeeds_with_live_collector() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        serve_forever(listener);

        let config = TelemetryConfig {
            collector_endpoint: format!("127.0.0.1:{port}"),
            export_timeout_secs: 1,
            ..Default::default()
        };

        let (guard, tracing) = init_tracer(&config).await.unwrap();
        assert!(format!("{tracing:?}").contains("otelcurl/client"));
        tokio::task::spawn_blocking(move || drop(guard)).await.unwrap();
    }

    #[test]
    fn test_telemetry_guard_drop_does_not_panic() {
        let provider = SdkTracerProvider::builder().build();
        let guard = TelemetryGuard::from_provider(provider);
        drop(guard);
    }
}

//! HTTP probe adapter
//!
//! Implements [`ProbePort`] by sending a traced GET through
//! [`TracedHttpClient`]. Every call is wrapped in one operation span that is
//! tagged with the downstream service name and ended on every exit path.

use application::ports::{ProbeError, ProbePort, ProbeResponse};
use async_trait::async_trait;
use domain::{BaggageItem, TargetUrl};
use opentelemetry::{
    Context, KeyValue,
    baggage::BaggageExt,
    trace::{SpanKind, Status, TraceContextExt, Tracer},
};
use tracing::debug;

use crate::{
    errors::error_chain,
    http::{HttpError, TracedClientConfig, TracedHttpClient, semconv},
    telemetry::TracingContext,
};

/// Configuration for the probe adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAdapterConfig {
    /// Name of the operation span
    pub operation_name: String,
    /// Value of the `peer.service` attribute
    pub peer_service: String,
    /// Baggage attached to every request
    pub baggage: Vec<BaggageItem>,
}

impl Default for ProbeAdapterConfig {
    fn default() -> Self {
        Self {
            operation_name: "roll the dice".to_string(),
            peer_service: "rolldice-server".to_string(),
            baggage: Vec::new(),
        }
    }
}

impl ProbeAdapterConfig {
    /// Set the downstream service name
    #[must_use]
    pub fn with_peer_service(mut self, peer_service: impl Into<String>) -> Self {
        self.peer_service = peer_service.into();
        self
    }

    /// Add a baggage entry
    #[must_use]
    pub fn with_baggage(mut self, item: BaggageItem) -> Self {
        self.baggage.push(item);
        self
    }
}

impl From<HttpError> for ProbeError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Body(e) => Self::Body(error_chain(&e)),
            HttpError::Build(e) | HttpError::Request(e) => Self::Transport(error_chain(&e)),
        }
    }
}

/// Sends probe requests over HTTP with trace context propagation
#[derive(Debug, Clone)]
pub struct HttpProbeAdapter {
    client: TracedHttpClient,
    tracing: TracingContext,
    config: ProbeAdapterConfig,
}

impl HttpProbeAdapter {
    /// Create a new adapter
    pub fn new(
        tracing: TracingContext,
        client_config: TracedClientConfig,
        config: ProbeAdapterConfig,
    ) -> Result<Self, HttpError> {
        let client = TracedHttpClient::with_config(tracing.clone(), client_config)?;
        Ok(Self {
            client,
            tracing,
            config,
        })
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &ProbeAdapterConfig {
        &self.config
    }

    /// Root context for a new trace, carrying the configured baggage
    fn root_context(&self) -> Context {
        if self.config.baggage.is_empty() {
            return Context::new();
        }
        Context::new().with_baggage(
            self.config
                .baggage
                .iter()
                .map(|item| KeyValue::new(item.key().to_string(), item.value().to_string())),
        )
    }

    async fn fetch(&self, cx: &Context, endpoint: &str) -> Result<ProbeResponse, ProbeError> {
        let target = TargetUrl::new(endpoint)?;
        let response = self.client.get(cx, target.as_str()).await?;
        debug!(
            status = response.status.as_u16(),
            bytes = response.body.len(),
            "Probe response read"
        );
        Ok(ProbeResponse::new(response.status.as_u16(), response.body))
    }
}

#[async_trait]
impl ProbePort for HttpProbeAdapter {
    async fn send(&self, endpoint: &str) -> Result<ProbeResponse, ProbeError> {
        let root = self.root_context();
        let tracer = self.tracing.tracer();
        let span = tracer
            .span_builder(self.config.operation_name.clone())
            .with_kind(SpanKind::Internal)
            .with_attributes([KeyValue::new(
                semconv::PEER_SERVICE,
                self.config.peer_service.clone(),
            )])
            .start_with_context(tracer, &root);
        let cx = root.with_span(span);

        let result = self.fetch(&cx, endpoint).await;

        let span = cx.span();
        if let Err(e) = &result {
            span.record_error(e);
            span.set_status(Status::error(e.to_string()));
        }
        span.end();

        result
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry_sdk::trace::SdkTracerProvider;

    use super::*;

    fn adapter(config: ProbeAdapterConfig) -> HttpProbeAdapter {
        let tracing = TracingContext::new(&SdkTracerProvider::builder().build());
        HttpProbeAdapter::new(tracing, TracedClientConfig::default(), config).unwrap()
    }

    #[test]
    fn config_default() {
        let config = ProbeAdapterConfig::default();
        assert_eq!(config.operation_name, "roll the dice");
        assert_eq!(config.peer_service, "rolldice-server");
        assert!(config.baggage.is_empty());
    }

    #[test]
    fn config_builders() {
        let config = ProbeAdapterConfig::default()
            .with_peer_service("inventory")
            .with_baggage("tenant=blue".parse().unwrap());
        assert_eq!(config.peer_service, "inventory");
        assert_eq!(config.baggage.len(), 1);
    }

    #[test]
    fn root_context_without_baggage_is_empty() {
        let adapter = adapter(ProbeAdapterConfig::default());
        let cx = adapter.root_context();
        assert_eq!(cx.baggage().len(), 0);
        assert!(!cx.has_active_span());
    }

    #[test]
    fn root_context_carries_baggage() {
        let adapter = adapter(
            ProbeAdapterConfig::default()
                .with_baggage("tenant=blue".parse().unwrap())
                .with_baggage("region=eu".parse().unwrap()),
        );
        let cx = adapter.root_context();
        assert_eq!(cx.baggage().len(), 2);
        assert_eq!(
            cx.baggage().get("tenant").map(ToString::to_string).as_deref(),
            Some("blue")
        );
    }

    #[tokio::test]
    async fn empty_endpoint_is_a_configuration_error() {
        let adapter = adapter(ProbeAdapterConfig::default());
        let result = adapter.send("").await;
        assert!(matches!(result, Err(ProbeError::Configuration(_))));
    }

    #[test]
    fn http_errors_map_to_probe_errors() {
        let build_error = || {
            reqwest::Client::new()
                .get("::invalid")
                .build()
                .unwrap_err()
        };
        assert!(matches!(
            ProbeError::from(HttpError::Request(build_error())),
            ProbeError::Transport(_)
        ));
        assert!(matches!(
            ProbeError::from(HttpError::Body(build_error())),
            ProbeError::Body(_)
        ));
    }
}

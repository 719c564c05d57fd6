//! HTTP client with automatic trace context propagation
//!
//! Wraps `reqwest::Client` so that every request runs inside a client span
//! whose context is injected into the outgoing headers. The response body is
//! read to the end inside the span, which also returns the connection to the
//! pool before the span closes.
//!
//! # Examples
//!
//! ```ignore
//! use infrastructure::http::{TracedClientConfig, TracedHttpClient};
//! use opentelemetry::Context;
//!
//! let client = TracedHttpClient::with_config(tracing, TracedClientConfig::default())?;
//! let response = client.get(&Context::new(), "http://localhost:5000/rolldice").await?;
//! println!("{}", String::from_utf8_lossy(&response.body));
//! ```

use std::time::Duration;

use bytes::Bytes;
use opentelemetry::{
    Context, KeyValue,
    trace::{SpanKind, Status, TraceContextExt, Tracer},
};
use reqwest::{Client, Request, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::{errors::error_chain, telemetry::TracingContext};

/// Attribute keys from the OpenTelemetry HTTP semantic conventions
pub mod semconv {
    /// HTTP request method
    pub const HTTP_REQUEST_METHOD: &str = "http.request.method";
    /// HTTP response status code
    pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";
    /// Absolute request URL
    pub const URL_FULL: &str = "url.full";
    /// Host the request was sent to
    pub const SERVER_ADDRESS: &str = "server.address";
    /// Port the request was sent to
    pub const SERVER_PORT: &str = "server.port";
    /// Logical name of the remote service
    pub const PEER_SERVICE: &str = "peer.service";
}

/// Name of the span wrapping each outgoing GET
const CLIENT_SPAN_NAME: &str = "HTTP GET";

/// Errors from the traced HTTP client
#[derive(Debug, Error)]
pub enum HttpError {
    /// The underlying client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request could not be built or sent, or no response arrived
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response body could not be read to the end
    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Configuration for the traced HTTP client
#[derive(Debug, Clone)]
pub struct TracedClientConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout, body included
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for TracedClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            user_agent: format!("otelcurl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TracedClientConfig {
    /// Set the whole-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct TracedResponse {
    /// Response status
    pub status: StatusCode,
    /// Complete response body
    pub body: Bytes,
}

/// HTTP client that propagates the W3C trace context of each request
#[derive(Debug, Clone)]
pub struct TracedHttpClient {
    inner: Client,
    tracing: TracingContext,
    config: TracedClientConfig,
}

impl TracedHttpClient {
    /// Create a new client with custom configuration
    pub fn with_config(
        tracing: TracingContext,
        config: TracedClientConfig,
    ) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            inner,
            tracing,
            config,
        })
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &TracedClientConfig {
        &self.config
    }

    /// Send a GET request as a child of `parent` and read the whole body
    ///
    /// Status codes of 400 and above mark the client span as failed but are
    /// returned as a normal response.
    pub async fn get(&self, parent: &Context, url: &str) -> Result<TracedResponse, HttpError> {
        let mut request = self.inner.get(url).build().map_err(HttpError::Request)?;

        let tracer = self.tracing.tracer();
        let span = tracer
            .span_builder(CLIENT_SPAN_NAME)
            .with_kind(SpanKind::Client)
            .with_attributes(request_attributes(&request))
            .start_with_context(tracer, parent);
        let cx = parent.with_span(span);

        self.tracing.inject(&cx, request.headers_mut());
        debug!(url = %request.url(), "Sending traced HTTP request");

        let result = self.execute(request).await;

        let span = cx.span();
        match &result {
            Ok(response) => {
                span.set_attribute(KeyValue::new(
                    semconv::HTTP_RESPONSE_STATUS_CODE,
                    i64::from(response.status.as_u16()),
                ));
                if response.status.is_client_error() || response.status.is_server_error() {
                    span.set_status(Status::error(format!("HTTP {}", response.status)));
                }
            },
            Err(e) => {
                span.record_error(e);
                span.set_status(Status::error(error_chain(e)));
            },
        }
        span.end();

        result
    }

    async fn execute(&self, request: Request) -> Result<TracedResponse, HttpError> {
        let response = self
            .inner
            .execute(request)
            .await
            .map_err(HttpError::Request)?;
        let status = response.status();
        let body = response.bytes().await.map_err(HttpError::Body)?;
        Ok(TracedResponse { status, body })
    }
}

fn request_attributes(request: &Request) -> Vec<KeyValue> {
    let url = request.url();
    let mut attributes = vec![
        KeyValue::new(semconv::HTTP_REQUEST_METHOD, request.method().to_string()),
        KeyValue::new(semconv::URL_FULL, url.to_string()),
    ];
    if let Some(host) = url.host_str() {
        attributes.push(KeyValue::new(semconv::SERVER_ADDRESS, host.to_string()));
    }
    if let Some(port) = url.port_or_known_default() {
        attributes.push(KeyValue::new(semconv::SERVER_PORT, i64::from(port)));
    }
    attributes
}

//! Application configuration
//!
//! Collects everything the probe needs before it touches the network. The
//! CLI fills an [`AppConfig`] from flags and environment variables, then the
//! typed configs for each component are derived from it.

use std::time::Duration;

use application::PollingConfig;
use domain::{BaggageItem, DomainError, PollInterval, TargetUrl};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::ProbeAdapterConfig,
    http::TracedClientConfig,
    telemetry::{LogConfig, TelemetryConfig},
};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Probe loop configuration
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Trace export configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Console log configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Probe loop and request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Endpoint to poll; empty until configured
    #[serde(default)]
    pub endpoint: String,

    /// Wait between two requests
    #[serde(default)]
    pub interval: PollInterval,

    /// Stop after this many successful requests
    #[serde(default)]
    pub max_requests: Option<u64>,

    /// Value of the `peer.service` span attribute
    #[serde(default = "default_peer_service")]
    pub peer_service: String,

    /// Baggage attached to every request
    #[serde(default)]
    pub baggage: Vec<BaggageItem>,

    /// Whole-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_peer_service() -> String {
    "rolldice-server".to_string()
}

const fn default_request_timeout() -> u64 {
    30_000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            interval: PollInterval::default(),
            max_requests: None,
            peer_service: default_peer_service(),
            baggage: Vec::new(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl ProbeConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AppConfig {
    /// Validated target endpoint
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingEndpoint`] if no endpoint is configured.
    pub fn target(&self) -> Result<TargetUrl, DomainError> {
        TargetUrl::new(&self.probe.endpoint)
    }

    /// Configuration for the polling loop
    pub fn polling_config(&self) -> Result<PollingConfig, DomainError> {
        let config = PollingConfig::new(self.target()?, self.probe.interval);
        Ok(match self.probe.max_requests {
            Some(max) => config.with_max_requests(max),
            None => config,
        })
    }

    /// Configuration for the probe adapter
    #[must_use]
    pub fn adapter_config(&self) -> ProbeAdapterConfig {
        ProbeAdapterConfig {
            peer_service: self.probe.peer_service.clone(),
            baggage: self.probe.baggage.clone(),
            ..ProbeAdapterConfig::default()
        }
    }

    /// Configuration for the traced HTTP client
    #[must_use]
    pub fn client_config(&self) -> TracedClientConfig {
        TracedClientConfig::default().with_timeout(self.probe.request_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_target() {
        let config = AppConfig::default();
        assert_eq!(config.target(), Err(DomainError::MissingEndpoint));
        assert!(config.polling_config().is_err());
    }

    #[test]
    fn probe_config_defaults() {
        let probe = ProbeConfig::default();
        assert_eq!(probe.interval, PollInterval::DEFAULT);
        assert_eq!(probe.peer_service, "rolldice-server");
        assert_eq!(probe.request_timeout(), Duration::from_secs(30));
        assert!(probe.max_requests.is_none());
    }

    #[test]
    fn polling_config_carries_limit() {
        let mut config = AppConfig::default();
        config.probe.endpoint = "http://localhost:5000/rolldice".to_string();
        config.probe.interval = PollInterval::from_duration(Duration::from_secs(2));
        config.probe.max_requests = Some(3);

        let polling = config.polling_config().unwrap();
        assert_eq!(polling.target.as_str(), "http://localhost:5000/rolldice");
        assert_eq!(polling.interval.as_duration(), Duration::from_secs(2));
        assert_eq!(polling.max_requests, Some(3));
    }

    #[test]
    fn adapter_config_uses_probe_settings() {
        let mut config = AppConfig::default();
        config.probe.peer_service = "dice".to_string();
        config.probe.baggage = vec!["tenant=blue".parse().unwrap()];

        let adapter = config.adapter_config();
        assert_eq!(adapter.peer_service, "dice");
        assert_eq!(adapter.operation_name, "roll the dice");
        assert_eq!(adapter.baggage.len(), 1);
    }

    #[test]
    fn client_config_uses_request_timeout() {
        let mut config = AppConfig::default();
        config.probe.request_timeout_ms = 1500;
        assert_eq!(
            config.client_config().timeout,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"probe": {"endpoint": "http://dice/rolldice", "interval": "1m30s"}}"#,
        )
        .unwrap();
        assert_eq!(config.probe.interval.to_string(), "1m30s");
        assert_eq!(config.telemetry.collector_endpoint, "localhost:4317");
        assert_eq!(config.log.filter, "warn");
        assert!(config.target().is_ok());
    }
}

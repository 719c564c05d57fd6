//! Probe port
//!
//! Defines the interface for sending one traced request to the target
//! endpoint.

use std::borrow::Cow;

use async_trait::async_trait;
use bytes::Bytes;
use domain::DomainError;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Errors returned by a probe request
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The target endpoint is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(#[from] DomainError),

    /// The request could not be sent or no response arrived
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Response to a single probe request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code
    pub status: u16,
    /// Complete response body
    pub body: Bytes,
}

impl ProbeResponse {
    /// Create a response
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Port for sending one traced request
///
/// Each call opens exactly one operation span and ends it before returning,
/// whether the request succeeds or not.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Send a single GET request to `endpoint` and read the full body
    ///
    /// An empty endpoint fails with [`ProbeError::Configuration`] without
    /// touching the network.
    async fn send(&self, endpoint: &str) -> Result<ProbeResponse, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_text_decodes_utf8() {
        let response = ProbeResponse::new(200, "4");
        assert_eq!(response.body_text(), "4");
    }

    #[test]
    fn body_text_is_lossy() {
        let response = ProbeResponse::new(200, vec![0x66, 0x6f, 0xff]);
        assert_eq!(response.body_text(), "fo\u{fffd}");
    }

    #[test]
    fn configuration_error_wraps_domain_error() {
        let err = ProbeError::from(DomainError::MissingEndpoint);
        assert_eq!(
            err.to_string(),
            "Configuration error: Must specify an endpoint with -endpoint"
        );
    }

    #[test]
    fn body_error_message() {
        let err = ProbeError::Body("unexpected eof".to_string());
        assert_eq!(err.to_string(), "Failed to read response body: unexpected eof");
    }
}

//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// No target endpoint was configured
    #[error("Must specify an endpoint with -endpoint")]
    MissingEndpoint,

    /// Interval string could not be parsed as a duration
    #[error("Invalid interval {input:?}: {reason}")]
    InvalidInterval { input: String, reason: String },

    /// Baggage entry is not a `key=value` pair
    #[error("Invalid baggage entry {0:?}: expected key=value")]
    InvalidBaggage(String),
}

impl DomainError {
    /// Create an invalid interval error
    pub fn invalid_interval(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

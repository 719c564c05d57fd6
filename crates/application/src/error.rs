//! Application-level errors

use thiserror::Error;

use crate::ports::ProbeError;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A probe request failed
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Writing progress output failed
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

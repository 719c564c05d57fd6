//! Domain layer for otelcurl
//!
//! Contains the value objects the probe is configured with and the
//! domain errors raised when that configuration is invalid.

pub mod errors;
pub mod value_objects;

pub use errors::DomainError;
pub use value_objects::*;

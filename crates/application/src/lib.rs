//! Application layer - Use cases and orchestration
//!
//! Defines the port the probe sends requests through and the polling
//! service that drives it.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;

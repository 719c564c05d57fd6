//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod probe_port;

#[cfg(test)]
pub use probe_port::MockProbePort;
pub use probe_port::{ProbeError, ProbePort, ProbeResponse};

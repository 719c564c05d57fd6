//! Adapters implementing application ports

mod http_probe_adapter;

pub use http_probe_adapter::{HttpProbeAdapter, ProbeAdapterConfig};

//! Application services - Use case implementations

mod polling_service;

pub use polling_service::{PollOutcome, PollingConfig, PollingService, StopReason};

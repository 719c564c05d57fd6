//! Polling service
//!
//! Sends one probe request, reports the response, waits for the configured
//! interval and repeats. The first failed request stops the loop.

use std::{io::Write, sync::Arc};

use domain::{PollInterval, TargetUrl};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::{error::ApplicationError, ports::ProbePort};

/// Configuration for the polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Endpoint every request goes to
    pub target: TargetUrl,
    /// Wait between two successful requests
    pub interval: PollInterval,
    /// Stop after this many successful requests (`None` = run until cancelled)
    pub max_requests: Option<u64>,
}

impl PollingConfig {
    /// Create a configuration that polls `target` every `interval` forever
    #[must_use]
    pub const fn new(target: TargetUrl, interval: PollInterval) -> Self {
        Self {
            target,
            interval,
            max_requests: None,
        }
    }

    /// Stop after `max` successful requests
    #[must_use]
    pub const fn with_max_requests(mut self, max: u64) -> Self {
        self.max_requests = Some(max);
        self
    }
}

/// Why the polling loop returned without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation token fired
    Cancelled,
    /// The configured request limit was reached
    MaxRequests,
}

/// Result of a polling run that ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Number of successful requests
    pub iterations: u64,
    /// Why the loop stopped
    pub reason: StopReason,
}

/// Drives the probe in a strictly sequential loop
pub struct PollingService {
    probe: Arc<dyn ProbePort>,
    config: PollingConfig,
}

impl std::fmt::Debug for PollingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PollingService {
    /// Create a new polling service
    #[must_use]
    pub fn new(probe: Arc<dyn ProbePort>, config: PollingConfig) -> Self {
        Self { probe, config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &PollingConfig {
        &self.config
    }

    /// Run the loop until cancelled, the request limit is hit, or a request fails
    ///
    /// Progress lines are written to `out`. Cancellation is observed before
    /// each request and while sleeping; a request already in flight always
    /// completes. There is no retry: the first error is returned as is.
    #[instrument(skip_all, fields(target = %self.config.target, interval = %self.config.interval))]
    pub async fn run<W: Write + Send>(
        &self,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, ApplicationError> {
        let interval = self.config.interval;
        let mut iterations: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                info!(iterations, "Polling cancelled");
                return Ok(PollOutcome {
                    iterations,
                    reason: StopReason::Cancelled,
                });
            }

            writeln!(out, "Sending request...")?;
            out.flush()?;

            let response = match self.probe.send(self.config.target.as_str()).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, iterations, "Probe request failed, stopping");
                    return Err(e.into());
                },
            };
            iterations += 1;
            debug!(status = response.status, bytes = response.body.len(), "Response received");

            writeln!(out, "Response Received: {}", response.body_text())?;

            if self.config.max_requests.is_some_and(|max| iterations >= max) {
                out.flush()?;
                info!(iterations, "Request limit reached");
                return Ok(PollOutcome {
                    iterations,
                    reason: StopReason::MaxRequests,
                });
            }

            writeln!(out, "Waiting {:?} before next request", interval.to_string())?;
            out.flush()?;

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(iterations, "Polling cancelled while waiting");
                    return Ok(PollOutcome {
                        iterations,
                        reason: StopReason::Cancelled,
                    });
                },
                () = tokio::time::sleep(interval.as_duration()) => {},
            }
        }
    }
}

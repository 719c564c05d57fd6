//! otelcurl command-line front end
//!
//! Parses flags into an [`infrastructure::AppConfig`], wires the probe
//! adapter into the polling loop and stops it on SIGINT/SIGTERM.

pub mod cli;

use std::{io::Write, sync::Arc};

use anyhow::Context as _;
use application::{PollOutcome, PollingConfig, PollingService};
use infrastructure::{AppConfig, HttpProbeAdapter, TracingContext};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use cli::{Cli, log_filter_from_verbosity, normalize_args};

/// Build the probe and run the polling loop until it stops
///
/// `polling` must come from [`AppConfig::polling_config`] so the endpoint
/// has already been validated.
pub async fn run_probe<W: Write + Send>(
    config: &AppConfig,
    polling: PollingConfig,
    tracing: TracingContext,
    out: &mut W,
    cancel: &CancellationToken,
) -> anyhow::Result<PollOutcome> {
    let adapter = HttpProbeAdapter::new(tracing, config.client_config(), config.adapter_config())
        .context("Failed to build HTTP client")?;
    let service = PollingService::new(Arc::new(adapter), polling);
    Ok(service.run(out, cancel).await?)
}

/// Cancel `token` on the first SIGINT or SIGTERM
pub async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        }
        () = terminate => {
            info!("Received SIGTERM, stopping");
        }
        () = token.cancelled() => {}
    }

    token.cancel();
}

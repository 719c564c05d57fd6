//! otelcurl
//!
//! Sends a traced HTTP GET to an endpoint at a fixed interval and exports
//! the spans to an OTLP/gRPC collector.

use anyhow::Context as _;
use clap::Parser;
use infrastructure::{init_logging, init_tracer};
use presentation_cli::{Cli, cancel_on_signal, normalize_args, run_probe};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let config = cli.into_app_config();

    init_logging(&config.log).context("Failed to initialize logging")?;

    // Reject a missing endpoint before dialing the collector
    let polling = config.polling_config()?;

    let (guard, tracing) = init_tracer(&config.telemetry).await?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let result = run_probe(&config, polling, tracing, &mut std::io::stdout(), &cancel).await;
    cancel.cancel();

    // Flush buffered spans on every exit path, failures included
    match tokio::task::spawn_blocking(move || guard.shutdown()).await {
        Ok(Ok(())) => {},
        Ok(Err(e)) => warn!(error = %e, "Failed to flush spans"),
        Err(e) => warn!(error = %e, "Span flush task failed"),
    }

    let outcome = result?;
    info!(
        iterations = outcome.iterations,
        reason = ?outcome.reason,
        "otelcurl stopped"
    );
    Ok(())
}

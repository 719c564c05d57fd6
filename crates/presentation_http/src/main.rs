//! rolldice HTTP server
//!
//! Demo target for otelcurl.

use anyhow::Context as _;
use clap::Parser;
use infrastructure::{LogConfig, LogFormat, init_logging};
use presentation_http::create_router;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;

/// rolldice server
#[derive(Debug, Parser)]
#[command(name = "rolldice-server")]
#[command(author, version, about = "Serve random dice rolls on GET /rolldice", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "ROLLDICE_BIND", default_value = "0.0.0.0:5000")]
    bind: String,

    /// Log output format (pretty or json)
    #[arg(long, env = "ROLLDICE_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&LogConfig {
        filter: "rolldice_server=info,presentation_http=debug,tower_http=debug".to_string(),
        format: args.log_format,
    })
    .context("Failed to initialize logging")?;

    let app = create_router().layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    info!("rolldice-server v{} listening on http://{}", env!("CARGO_PKG_VERSION"), args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
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
            info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}

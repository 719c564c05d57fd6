//! Command-line arguments
//!
//! Flags follow the Go `flag` package conventions the probe has always
//! accepted (`-endpoint http://...`, `-interval=5s`) as well as the usual
//! `--long` spelling.

use std::{ffi::OsString, time::Duration};

use clap::Parser;
use domain::{BaggageItem, PollInterval};
use infrastructure::{
    AppConfig, LogConfig, LogFormat, ProbeConfig, TelemetryConfig,
    telemetry::COLLECTOR_ENDPOINT_ENV,
};

/// Long flags that may also be written with a single leading dash
const LONG_FLAGS: &[&str] = &[
    "endpoint",
    "interval",
    "collector",
    "connect-timeout",
    "request-timeout",
    "service-name",
    "peer-service",
    "baggage",
    "max-requests",
    "log-format",
    "help",
    "version",
];

/// otelcurl
#[derive(Debug, Parser)]
#[command(name = "otelcurl")]
#[command(
    author,
    version,
    about = "Send HTTP GET requests at a fixed interval and export a trace for each one",
    long_about = None
)]
pub struct Cli {
    /// Endpoint to send requests to
    #[arg(long, default_value = "")]
    pub endpoint: String,

    /// Wait between requests, e.g. 10s, 1m30s, 500ms
    #[arg(long, default_value = "10s")]
    pub interval: PollInterval,

    /// OTLP/gRPC collector address
    #[arg(long, env = COLLECTOR_ENDPOINT_ENV, default_value = "localhost:4317")]
    pub collector: String,

    /// How long to wait for the collector connection at startup
    #[arg(long, default_value = "1s")]
    pub connect_timeout: PollInterval,

    /// Timeout for a single request, body included
    #[arg(long, default_value = "30s")]
    pub request_timeout: PollInterval,

    /// Service name reported with every span
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "otelcurl")]
    pub service_name: String,

    /// Value of the peer.service attribute on the request span
    #[arg(long, default_value = "rolldice-server")]
    pub peer_service: String,

    /// Baggage entry sent with every request (repeatable)
    #[arg(long = "baggage", value_name = "KEY=VALUE")]
    pub baggage: Vec<BaggageItem>,

    /// Stop after this many successful requests
    #[arg(long)]
    pub max_requests: Option<u64>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format (pretty or json)
    #[arg(long, env = "OTELCURL_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Parse arguments, accepting single-dash long flags
    pub fn try_parse_normalized<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Build the application configuration
    #[must_use]
    pub fn into_app_config(self) -> AppConfig {
        AppConfig {
            probe: ProbeConfig {
                endpoint: self.endpoint,
                interval: self.interval,
                max_requests: self.max_requests,
                peer_service: self.peer_service,
                baggage: self.baggage,
                request_timeout_ms: millis(self.request_timeout.as_duration()),
            },
            telemetry: TelemetryConfig {
                collector_endpoint: self.collector,
                service_name: self.service_name,
                connect_timeout_ms: millis(self.connect_timeout.as_duration()),
                ..TelemetryConfig::default()
            },
            log: LogConfig {
                filter: log_filter_from_verbosity(self.verbose).to_string(),
                format: self.log_format,
            },
        }
    }
}

/// Rewrite Go-style `-flag` and `-flag=value` arguments to `--flag`
///
/// Only known long flags are rewritten, so `-v` and `-vv` keep working.
/// Everything after a `--` terminator is passed through untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut terminated = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if terminated {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                terminated = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') && is_long_flag(rest) => {
                    OsString::from(format!("-{text}"))
                },
                _ => arg,
            }
        })
        .collect()
}

fn is_long_flag(arg: &str) -> bool {
    let name = arg.split_once('=').map_or(arg, |(name, _)| name);
    LONG_FLAGS.contains(&name)
}

/// Determine log filter level from verbosity count
pub const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Whole milliseconds, rounded up so sub-millisecond timeouts stay non-zero
fn millis(duration: Duration) -> u64 {
    let partial = u128::from(duration.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(duration.as_millis() + partial).unwrap_or(u64::MAX)
}

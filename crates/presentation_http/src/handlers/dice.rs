//! Dice handlers

use axum::http::HeaderMap;
use infrastructure::telemetry::extract_context;
use opentelemetry::trace::TraceContextExt;
use rand::Rng;
use tracing::debug;

/// Roll a six-sided die
pub fn roll() -> u8 {
    rand::rng().random_range(1..=6)
}

/// Roll the dice and return the result as plain text
pub async fn roll_dice(headers: HeaderMap) -> String {
    let cx = extract_context(&headers);
    let span = cx.span();
    let remote = span.span_context();
    let value = roll();

    if remote.is_valid() {
        debug!(
            trace_id = %remote.trace_id(),
            parent_span_id = %remote.span_id(),
            value,
            "Rolled dice for traced request"
        );
    } else {
        debug!(value, "Rolled dice");
    }

    value.to_string()
}

//! HTTP client with trace context propagation
//!
//! Every outgoing request gets a client span and carries the W3C
//! `traceparent` and `baggage` headers of that span.

mod traced_client;

pub use traced_client::{
    HttpError, TracedClientConfig, TracedHttpClient, TracedResponse, semconv,
};

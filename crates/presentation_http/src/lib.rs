//! rolldice HTTP presentation layer
//!
//! A tiny demo service for the probe to call: `GET /rolldice` answers with a
//! random number between 1 and 6.

pub mod handlers;
pub mod routes;

pub use routes::create_router;

//! Route definitions

use axum::{Router, routing::get};

use crate::handlers;

/// Create the main router with all routes
pub fn create_router() -> Router {
    Router::new().route("/rolldice", get(handlers::dice::roll_dice))
}

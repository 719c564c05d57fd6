//! Value Objects - Immutable, identity-less domain primitives

mod baggage_item;
mod poll_interval;
mod target_url;

pub use baggage_item::BaggageItem;
pub use poll_interval::PollInterval;
pub use target_url::TargetUrl;

//! HTTP request handlers

pub mod dice;

//! Tiergate - terminal host for a tiered task session
//!
//! Wires the HTTP clients into a [`tiergate_sdk::Session`] for the
//! configured customer and drives it from stdin.

pub mod config;
pub mod repl;

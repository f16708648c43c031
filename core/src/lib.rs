//! # Lilium Core
//!
//! Shared utilities for the Lilium frame pipeline: culling math, signals
//! with scoped subscriptions, lazily recomputed values and profiling hooks.

pub mod lazy;
pub mod math;
pub mod profiling;
pub mod signal;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn init() {
    log::info!("Lilium Core v{} initialized", VERSION);
}

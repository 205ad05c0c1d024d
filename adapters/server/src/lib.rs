#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Server-side composition of the Horde Survival engine.
//!
//! Provides the [`HordeEngine`] composition root, TOML configuration loading,
//! and tracing initialisation used by the `horde-survival` binary.

pub mod config;
mod engine;
pub mod tracing_init;

pub use engine::{HordeEngine, TickReport};

//! Producer boundary schema
//!
//! Defines the events a telemetry producer hands to the engine and the
//! helpers for reading them from a newline-delimited log.

mod adapter;
mod event;

pub use adapter::*;
pub use event::*;

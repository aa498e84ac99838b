//! Pulse Ledger - local telemetry aggregation for a personal fitness tracker
//!
//! Mirrors heart-rate, step and sleep telemetry into an in-memory store and
//! derives day and week level statistics without a server round-trip:
//! producer events → step reconciliation → sample store → daily aggregates,
//! weekly trends, sleep summaries and an activity score.
//!
//! ## Modules
//!
//! - **Store**: raw samples, per-day step totals, retention pruning
//! - **Aggregators**: daily, weekly trend, sleep and activity score queries
//! - **Engine**: thread-safe wrapper shared by producer and display threads

pub mod config;
pub mod daily;
pub mod engine;
pub mod error;
pub mod reconciler;
pub mod schema;
pub mod score;
pub mod sleep;
pub mod store;
pub mod trend;
pub mod types;

pub use config::EngineConfig;
pub use engine::{IngestSummary, Ingested, TelemetryEngine};
pub use error::TelemetryError;
pub use schema::{ProducerEvent, ProducerLog, SleepPayload, TelemetryReading, TelemetryType};

/// Crate version, reported by the CLI
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

//! Error types for the telemetry engine
//!
//! Only the ingestion boundary and configuration loading can fail. Aggregate
//! queries report missing data as `None`, never as an error.

use crate::schema::ValidationError;
use thiserror::Error;

/// Errors that can occur while accepting producer data or configuration
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to parse producer record: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid producer record: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

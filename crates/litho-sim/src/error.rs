//! Error types for litho-sim.
//!
//! The metric model itself never fails. Errors only arise at the input
//! boundary (names that do not resolve, intervals outside the fixed set),
//! when loading a config file, or when the driver task has gone away.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SimError {
    /// Parameter name does not match any control parameter
    #[error("Unknown control parameter: {0}")]
    UnknownParameter(String),

    /// Metric name does not match any reading series
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown chart kind: {0}")]
    UnknownChartKind(String),

    /// Tick interval is not one of the selectable periods
    #[error("Unsupported tick interval: {0}ms (expected 500, 1000 or 2000)")]
    UnsupportedTickInterval(u64),

    /// Malformed `name=value` parameter assignment
    #[error("Invalid parameter assignment: {0}")]
    InvalidAssignment(String),

    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The driver task has shut down and no longer accepts commands
    #[error("Simulation driver is not running")]
    DriverStopped,
}

pub type Result<T> = std::result::Result<T, SimError>;

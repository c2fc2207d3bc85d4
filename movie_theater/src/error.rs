//! Error types for the movie theater model

use thiserror::Error;

use crate::Station;

#[derive(Debug, Error)]
pub enum TheaterError {
    /// A pool of capacity zero would block every requester forever
    #[error("{station} capacity must be positive")]
    ZeroCapacity { station: Station },

    #[error("horizon must be a positive, finite number of minutes, got {0}")]
    InvalidHorizon(f64),

    #[error("invalid {name} distribution: {reason}")]
    InvalidDistribution { name: &'static str, reason: String },

    #[error("no staffing configuration fits a budget of {total} employees")]
    EmptySearch { total: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

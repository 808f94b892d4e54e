//! Error types for NDN forwarding strategies

use std::time::Duration;

use thiserror::Error;

/// Strategy error type
#[derive(Error, Debug)]
pub enum NdnError {
    /// Loss window must be strictly larger than the interest lifetime
    #[error("loss window {window:?} must be greater than interest lifetime {lifetime:?}")]
    InvalidWindow {
        /// Configured interest lifetime
        lifetime: Duration,
        /// Configured sliding window
        window: Duration,
    },

    /// Metric not supported by the queried estimator
    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    /// Malformed name URI
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Malformed strategy parameter value
    #[error("invalid parameter {key}: {value}")]
    InvalidParameter {
        /// Parameter key as written
        key: String,
        /// Offending value
        value: String,
    },

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for NDN strategies
pub type NdnResult<T> = Result<T, NdnError>;

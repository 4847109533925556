//! Error types for the Spot Termination Exporter
//!
//! Only startup and serving failures are errors. Probe failures during a scrape
//! are classified into `ProbeOutcome` variants and never surface here.

use thiserror::Error;

/// Fatal, process-ending errors
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Invalid command-line or environment configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Log level not understood
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Tracing subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),

    /// Metrics listener could not be bound
    #[error("Failed to bind metrics server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Metrics server stopped with an I/O error
    #[error("Metrics server error: {0}")]
    Serve(#[from] std::io::Error),

    /// Collector registration or encoding failure
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ExporterError {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        ExporterError::InvalidConfig(msg.into())
    }
}

/// Result type alias for exporter operations
pub type Result<T> = std::result::Result<T, ExporterError>;

//! Error types for beaconpost

use thiserror::Error;

/// Main error type for the beaconpost client
#[derive(Error, Debug)]
pub enum Error {
    /// An operation that needs credentials ran before `configure`
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote API error (transport failure, non-2xx status, bad body)
    #[error("API error: {0}")]
    Api(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for beaconpost
pub type Result<T> = std::result::Result<T, Error>;

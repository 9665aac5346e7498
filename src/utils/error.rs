//! Error handling for the ping service
//!
//! This module defines the error type shared by the probes and entry points.

use thiserror::Error;

/// Result type alias for the ping service
pub type Result<T> = std::result::Result<T, PingError>;

/// Main error type for the ping service
///
/// Probe-internal failures are recovered at the probe safety boundary and
/// become `error` outcomes; this type propagates with `?` only inside probe
/// setup paths and in binary/server startup.
#[derive(Error, Debug)]
pub enum PingError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

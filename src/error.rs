//! Error types for the monitoring engine.
//!
//! None of these are fatal: fetch errors leave the previous data in place,
//! parse errors drop one record, config errors keep the previous config and
//! delivery errors only concern the consumer that lagged.

use thiserror::Error;

/// Errors that can occur when fetching raw records from the network.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The endpoint answered with a non-success status.
    #[error("API returned status {0}")]
    Status(u16),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

/// A raw record that cannot be turned into an entity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("record is not a JSON object")]
    NotAnObject,

    /// None of the identifying fields are present or non-empty.
    #[error("{kind} record has no identifier (expected one of: {fields})")]
    MissingIdentifier {
        kind: &'static str,
        fields: &'static str,
    },
}

/// Rejected configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("polling interval must be between 1 and 86400 seconds, got {0}")]
    InvalidInterval(u64),

    #[error("history limit must be at least 1, got {0}")]
    InvalidHistoryLimit(usize),

    #[error("invalid threshold {name}: {reason}")]
    InvalidThreshold {
        name: &'static str,
        reason: String,
    },

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting {
        name: &'static str,
        reason: String,
    },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Problems delivering snapshots to a push subscriber.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The subscriber fell behind and the oldest snapshots were dropped.
    #[error("subscriber lagged, {0} snapshots dropped")]
    Lagged(u64),

    /// The engine was dropped.
    #[error("snapshot channel closed")]
    Closed,
}

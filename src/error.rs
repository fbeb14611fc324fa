//! Error types for theme-updater.

use crate::config::MissingFields;
use thiserror::Error;

/// Result type alias for theme-updater operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in theme-updater.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration fields are absent.
    #[error(transparent)]
    MissingConfig(#[from] MissingFields),

    /// A configured URL could not be parsed.
    #[error("invalid URL in `{field}`: {source}")]
    InvalidUrl {
        /// Name of the offending field.
        field: &'static str,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Outbound request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Transient store error.
    #[error("transient store error: {0}")]
    Store(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

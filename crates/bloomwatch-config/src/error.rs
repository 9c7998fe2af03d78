//! Error types for config loading and validation.

use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a config file failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField {
        /// Dotted path of the offending field.
        path: String,
        /// Why the value was rejected.
        message: String,
    },
}

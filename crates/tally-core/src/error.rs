//! Error types and result aliases shared across tally components.
//!
//! Errors are structured for programmatic handling and include context for
//! debugging. Lookup misses are deliberately *not* errors anywhere in tally:
//! absence of voting state is a valid "not yet reported" condition and is
//! expressed as `Option`/empty collections instead.

/// The result type used throughout tally.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tally operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the ID invalid.
        message: String,
    },

    /// An invalid configuration value was provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what made the configuration invalid.
        message: String,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new invalid identifier error.
    #[must_use]
    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    /// Creates a new invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

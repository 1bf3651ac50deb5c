//! Error types for the voting engine.
//!
//! Nothing in this crate is fatal to the owning process: lookup misses are
//! expressed as `Option`/empty collections, disagreement is a [`crate::evaluator::VotingOutcome`],
//! and an internal fault degrades a pending decision rather than propagating
//! a crash. The variants here cover the few genuinely exceptional paths.

/// The result type used throughout tally-vote.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voting operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
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

    /// An error from tally-core.
    #[error("core error: {0}")]
    Core(#[from] tally_core::Error),
}

impl Error {
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

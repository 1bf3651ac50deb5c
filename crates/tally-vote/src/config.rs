//! Voting configuration.
//!
//! The replication factor is supplied by the scheduler at job start; it is a
//! property of the job's launch policy, never derived from how many replicas
//! happen to have reported so far.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default replication factor: the smallest factor that tolerates one
/// faulty replica.
const DEFAULT_REPLICATION_FACTOR: usize = 3;

/// Configuration for a job's voting registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingConfig {
    /// Number of replicas launched per task.
    pub replication_factor: usize,
}

impl VotingConfig {
    /// Creates a configuration with the given replication factor.
    ///
    /// # Errors
    ///
    /// Returns an error if `replication_factor` is zero.
    pub fn new(replication_factor: usize) -> Result<Self> {
        if replication_factor == 0 {
            return Err(Error::invalid_config(
                "replication factor must be at least 1",
            ));
        }
        Ok(Self { replication_factor })
    }

    /// The minimum number of agreeing replicas required to accept a result.
    ///
    /// `floor(n/2) + 1`, where `n` is the replication factor.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.replication_factor / 2 + 1
    }
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            replication_factor: DEFAULT_REPLICATION_FACTOR,
        }
    }
}

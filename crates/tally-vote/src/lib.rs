//! # tally-vote
//!
//! Quorum voting and fault detection engine for clusters that execute work
//! on untrusted or failure-prone workers.
//!
//! Tasks are redundantly executed by several independent replicas; this
//! crate decides, from the result fingerprints the replicas report, whether
//! enough of them agree to accept a result — rather than trusting any
//! single worker.
//!
//! ## Core Concepts
//!
//! - **Registry**: Per-job owner of all voting state; the only entry point
//! - **Ledger**: One live digest entry per `(task, replica)` pair
//! - **Evaluator**: Pure quorum math — `floor(n/2) + 1` agreeing replicas
//!   accept a result
//! - **Completion log**: Arrival-order record of replica completion events
//!
//! ## Guarantees
//!
//! - **Race-free**: Mutations are atomic and isolated per task id
//! - **Incremental**: Decisions are recomputed as submissions arrive;
//!   `NoMajority` is not terminal — an extra replica can flip it
//! - **Non-blocking**: No operation waits for quorum or suspends
//!
//! ## Example
//!
//! ```rust
//! use tally_core::{Digest, JobId, ReplicaId, TaskId, TaskKind};
//! use tally_vote::config::VotingConfig;
//! use tally_vote::evaluator::VotingOutcome;
//! use tally_vote::registry::VotingRegistry;
//!
//! # fn main() -> tally_vote::error::Result<()> {
//! let registry = VotingRegistry::new(VotingConfig::new(3)?);
//! let job = JobId::new("202608080412_0003")?;
//! let task = TaskId::new(job, TaskKind::Reduce, 0);
//!
//! // Two of three replicas agree: quorum.
//! registry.submit_digest(&task, TaskKind::Reduce, ReplicaId::new(0), Digest::from_parts(["3ac1"]))?;
//! registry.submit_digest(&task, TaskKind::Reduce, ReplicaId::new(1), Digest::from_parts(["3ac1"]))?;
//! assert_eq!(registry.evaluate(&task), VotingOutcome::MajorityVoting);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

// Internal module - not exposed in public API.
pub(crate) mod slot;

pub mod completion_log;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod registry;
pub mod replica_index;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::completion_log::CompletionEventStore;
    pub use crate::config::VotingConfig;
    pub use crate::error::{Error, Result};
    pub use crate::evaluator::VotingOutcome;
    pub use crate::events::{CompletionStatus, TaskCompletionEvent};
    pub use crate::ledger::{DigestEntry, DigestLedger};
    pub use crate::metrics::VoteMetrics;
    pub use crate::registry::VotingRegistry;
    pub use crate::replica_index::ReplicaIndex;
}

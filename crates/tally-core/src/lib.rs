//! # tally-core
//!
//! Core primitives for the tally quorum voting engine.
//!
//! This crate provides the foundational types used across all tally
//! components:
//!
//! - **Identifiers**: Strongly-typed ids for jobs, tasks, and replicas
//! - **Digests**: The opaque output fingerprint replicas vote with
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Logging initialization and span helpers
//!
//! ## Crate Boundary
//!
//! `tally-core` is the **only** crate allowed to define shared primitives.
//! The voting engine itself lives in `tally-vote`.
//!
//! ## Example
//!
//! ```rust
//! use tally_core::prelude::*;
//!
//! let job = JobId::new("202608080412_0003").unwrap();
//! let task = TaskId::new(job, TaskKind::Reduce, 0);
//! let digest = Digest::from_parts(["3ac1f0"]);
//! assert_eq!(digest.arity(), 1);
//! # let _ = task;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod digest;
pub mod error;
pub mod id;
pub mod observability;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use tally_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::digest::Digest;
    pub use crate::error::{Error, Result};
    pub use crate::id::{JobId, ReplicaId, ReplicaTaskId, TaskId, TaskKind};
}

// Re-export key types at crate root for ergonomics
pub use digest::Digest;
pub use error::{Error, Result};
pub use id::{JobId, ReplicaId, ReplicaTaskId, TaskId, TaskKind};
pub use observability::{init_logging, LogFormat};

//! Strongly-typed identifiers for tally entities.
//!
//! All identifiers in tally are:
//! - **Strongly typed**: Prevents mixing up different ID kinds at compile time
//! - **Canonical**: `Display` and `FromStr` round-trip through a single
//!   canonical string form
//! - **Ordered**: Deterministic `Ord` for reproducible iteration in tests
//!   and diagnostics
//!
//! A [`TaskId`] names a logical unit of work independently of which replica
//! executed it; a [`ReplicaTaskId`] qualifies it with the replica that
//! produced a given report.
//!
//! # Example
//!
//! ```rust
//! use tally_core::id::{JobId, ReplicaId, TaskId, TaskKind};
//!
//! let job = JobId::new("202608080412_0003").unwrap();
//! let task = TaskId::new(job, TaskKind::Reduce, 7);
//! assert_eq!(task.to_string(), "task_202608080412_0003_r_000007");
//!
//! let replica = task.replica(ReplicaId::new(2));
//! assert_eq!(replica.to_string(), "task_202608080412_0003_r_000007_2");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A unique identifier for a job, the lifetime scope of all voting state.
///
/// Job ids are opaque strings assigned by the cluster; tally only requires
/// them to be non-empty and free of whitespace so the canonical task form
/// stays parseable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a job id from a raw string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or contains whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(Error::invalid_id("job id must not be empty"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(Error::invalid_id(format!(
                "job id '{raw}' must not contain whitespace"
            )));
        }
        Ok(Self(raw))
    }

    /// Returns the raw string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Whether a task belongs to the map or the reduce phase.
///
/// Carried alongside every digest submission so consumers can partition
/// decisions by phase without re-deriving it from the task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// A map-phase task.
    Map,
    /// A reduce-phase task.
    Reduce,
}

impl TaskKind {
    /// Single-character code used in the canonical task id form.
    #[must_use]
    pub const fn code(&self) -> char {
        match self {
            Self::Map => 'm',
            Self::Reduce => 'r',
        }
    }

    /// Parses the single-character code of the canonical form.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than `m` or `r`.
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'm' => Ok(Self::Map),
            'r' => Ok(Self::Reduce),
            other => Err(Error::invalid_id(format!(
                "unknown task kind code '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map => write!(f, "map"),
            Self::Reduce => write!(f, "reduce"),
        }
    }
}

/// A logical unit of work, independent of which replica executes it.
///
/// This is the primary key for all voting state. Canonical string form:
/// `task_{job}_{m|r}_{index:06}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskId {
    /// The owning job.
    pub job: JobId,
    /// Map or reduce phase.
    pub kind: TaskKind,
    /// Position of the task within its phase.
    pub index: u32,
}

impl TaskId {
    /// Creates a task id.
    #[must_use]
    pub const fn new(job: JobId, kind: TaskKind, index: u32) -> Self {
        Self { job, kind, index }
    }

    /// Qualifies this task id with the replica that produced a report.
    #[must_use]
    pub fn replica(&self, replica: ReplicaId) -> ReplicaTaskId {
        ReplicaTaskId {
            base: self.clone(),
            replica,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_{}_{}_{:06}", self.job, self.kind.code(), self.index)
    }
}

impl FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix("task_")
            .ok_or_else(|| Error::invalid_id(format!("task id '{s}' missing 'task_' prefix")))?;

        // Job ids may themselves contain underscores, so parse from the right:
        // the last segment is the index, the one before it the kind code.
        let mut parts = rest.rsplitn(3, '_');
        let index_part = parts
            .next()
            .ok_or_else(|| Error::invalid_id(format!("task id '{s}' missing index")))?;
        let kind_part = parts
            .next()
            .ok_or_else(|| Error::invalid_id(format!("task id '{s}' missing kind")))?;
        let job_part = parts
            .next()
            .ok_or_else(|| Error::invalid_id(format!("task id '{s}' missing job")))?;

        let index: u32 = index_part
            .parse()
            .map_err(|e| Error::invalid_id(format!("task id '{s}' has bad index: {e}")))?;

        let mut kind_chars = kind_part.chars();
        let (Some(code), None) = (kind_chars.next(), kind_chars.next()) else {
            return Err(Error::invalid_id(format!(
                "task id '{s}' has bad kind segment '{kind_part}'"
            )));
        };

        Ok(Self {
            job: JobId::new(job_part)?,
            kind: TaskKind::from_code(code)?,
            index,
        })
    }
}

/// Index of one redundant execution of a task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReplicaId(u32);

impl ReplicaId {
    /// Creates a replica id.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw replica index.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReplicaId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u32>()
            .map(Self)
            .map_err(|e| Error::invalid_id(format!("invalid replica id '{s}': {e}")))
    }
}

/// A task identity qualified by the replica that produced a given report.
///
/// Canonical string form: `{task}_{replica}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaTaskId {
    /// The replica-independent task identity.
    pub base: TaskId,
    /// The replica that produced the report.
    pub replica: ReplicaId,
}

impl ReplicaTaskId {
    /// Creates a replica-qualified task id.
    #[must_use]
    pub const fn new(base: TaskId, replica: ReplicaId) -> Self {
        Self { base, replica }
    }
}

impl fmt::Display for ReplicaTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.replica)
    }
}

impl FromStr for ReplicaTaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (base_part, replica_part) = s.rsplit_once('_').ok_or_else(|| {
            Error::invalid_id(format!("replica task id '{s}' missing replica suffix"))
        })?;
        Ok(Self {
            base: base_part.parse()?,
            replica: replica_part.parse()?,
        })
    }
}

//! Output fingerprints submitted by replicas.
//!
//! A [`Digest`] is an ordered sequence of opaque hash strings, one per output
//! partition of the task that produced it. Tally never interprets the hash
//! strings; it only compares them. Two digests of different arity are never
//! equal — a task kind always produces a fixed number of partitions, so an
//! arity mismatch is simply disagreement, not an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fingerprint of one replica's output.
///
/// Equality (and therefore vote grouping) requires equal arity and an exact
/// string match at every position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(Vec<String>);

impl Digest {
    /// Creates a digest from per-partition hash strings.
    #[must_use]
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    /// Creates a digest from anything yielding string-like parts.
    ///
    /// Convenience for tests and callers holding `&str` slices.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Number of output partitions this digest covers.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// The per-partition hash strings, in partition order.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Compares two digests position by position.
    ///
    /// Returns `true` iff the arities are equal and every position is an
    /// exact string match. An arity mismatch yields `false`, never an error.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{part}")?;
        }
        write!(f, "]")
    }
}

//! Quorum decision math.
//!
//! Pure functions over a ledger snapshot: grouping entries by digest
//! equality, comparing the largest agreeing group against the majority
//! threshold, and the tie/disagreement semantics that fall out of it. The
//! [`crate::registry::VotingRegistry`] wires these to live state; keeping
//! the math side-effect free makes every decision reproducible from a
//! snapshot in tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tally_core::Digest;

use crate::ledger::DigestEntry;

/// Decision result of a quorum evaluation.
///
/// A pure function of the ledger snapshot and the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VotingOutcome {
    /// A quorum of replicas agree on one digest; the result can be accepted.
    MajorityVoting,
    /// Enough replicas reported, but no digest commands a quorum — likely
    /// non-determinism or a faulty/adversarial replica. Escalation is the
    /// scheduler's responsibility.
    NoMajority,
    /// Too few submissions to confirm or exclude a future quorum; the
    /// decision is deferred.
    NotEnoughElements,
}

impl VotingOutcome {
    /// Returns true if a quorum exists.
    #[must_use]
    pub const fn is_majority(&self) -> bool {
        matches!(self, Self::MajorityVoting)
    }

    /// Returns true if the decision is still deferred.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::NotEnoughElements)
    }

    /// Returns a lowercase label suitable for metrics and logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::MajorityVoting => "majority_voting",
            Self::NoMajority => "no_majority",
            Self::NotEnoughElements => "not_enough_elements",
        }
    }
}

impl std::fmt::Display for VotingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// The minimum number of agreeing replicas required to accept a result.
///
/// `floor(n/2) + 1` for replication factor `n`.
#[must_use]
pub const fn threshold(replication_factor: usize) -> usize {
    replication_factor / 2 + 1
}

/// Size of the largest group of entries agreeing on one digest.
///
/// Zero for an empty snapshot.
#[must_use]
pub fn largest_agreeing_group(entries: &[DigestEntry]) -> usize {
    let mut groups: HashMap<&Digest, usize> = HashMap::new();
    for entry in entries {
        *groups.entry(&entry.digest).or_insert(0) += 1;
    }
    groups.values().copied().max().unwrap_or(0)
}

/// Computes the quorum decision for a ledger snapshot.
///
/// Fewer entries than the threshold defers the decision
/// ([`VotingOutcome::NotEnoughElements`]) — even a best-case future
/// agreement can neither be confirmed nor excluded yet. Otherwise the
/// largest agreeing group decides.
#[must_use]
pub fn evaluate(entries: &[DigestEntry], threshold: usize) -> VotingOutcome {
    if entries.len() < threshold {
        return VotingOutcome::NotEnoughElements;
    }
    if largest_agreeing_group(entries) >= threshold {
        VotingOutcome::MajorityVoting
    } else {
        VotingOutcome::NoMajority
    }
}

/// Returns true iff every entry in the snapshot equals `digest`.
///
/// Equality includes arity: a single entry of different length yields
/// false. Vacuously true for an empty snapshot.
#[must_use]
pub fn all_equal(entries: &[DigestEntry], digest: &Digest) -> bool {
    entries.iter().all(|entry| entry.digest.matches(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{JobId, ReplicaId, TaskId, TaskKind};

    fn entry(replica: u32, parts: &[&str]) -> DigestEntry {
        let job = JobId::new("eval_0001").unwrap();
        DigestEntry {
            task_id: TaskId::new(job, TaskKind::Reduce, 0),
            replica: ReplicaId::new(replica),
            kind: TaskKind::Reduce,
            digest: Digest::from_parts(parts.iter().copied()),
        }
    }

    #[test]
    fn threshold_is_strict_majority() {
        assert_eq!(threshold(1), 1);
        assert_eq!(threshold(3), 2);
        assert_eq!(threshold(4), 3);
        assert_eq!(threshold(5), 3);
        assert_eq!(threshold(7), 4);
    }

    #[test]
    fn defers_below_threshold() {
        let entries = vec![entry(0, &["d"]), entry(1, &["d"])];
        assert_eq!(
            evaluate(&entries, threshold(5)),
            VotingOutcome::NotEnoughElements
        );
    }

    #[test]
    fn majority_at_threshold() {
        let entries = vec![entry(0, &["d"]), entry(1, &["d"]), entry(2, &["d"])];
        assert_eq!(
            evaluate(&entries, threshold(5)),
            VotingOutcome::MajorityVoting
        );
    }

    #[test]
    fn disagreement_with_enough_entries_is_no_majority() {
        // n=5: [A, A, B, B, C] -> largest group 2 < threshold 3
        let entries = vec![
            entry(0, &["a"]),
            entry(1, &["a"]),
            entry(2, &["b"]),
            entry(3, &["b"]),
            entry(4, &["c"]),
        ];
        assert_eq!(evaluate(&entries, threshold(5)), VotingOutcome::NoMajority);
    }

    #[test]
    fn arity_mismatch_splits_groups() {
        // Same leading hash but different arity never groups together.
        let entries = vec![
            entry(0, &["a"]),
            entry(1, &["a", "b"]),
            entry(2, &["a", "b"]),
        ];
        assert_eq!(
            evaluate(&entries, threshold(3)),
            VotingOutcome::MajorityVoting
        );
        assert_eq!(largest_agreeing_group(&entries), 2);
    }

    #[test]
    fn largest_group_of_empty_snapshot_is_zero() {
        assert_eq!(largest_agreeing_group(&[]), 0);
    }

    #[test]
    fn all_equal_requires_exact_match_everywhere() {
        let target = Digest::from_parts(["a", "b"]);
        let agreeing = vec![entry(0, &["a", "b"]), entry(1, &["a", "b"])];
        assert!(all_equal(&agreeing, &target));

        let mixed = vec![entry(0, &["a", "b"]), entry(1, &["a"])];
        assert!(!all_equal(&mixed, &target));

        let disagreeing = vec![entry(0, &["a", "b"]), entry(1, &["a", "c"])];
        assert!(!all_equal(&disagreeing, &target));
    }

    #[test]
    fn all_equal_is_vacuously_true_for_empty_snapshot() {
        assert!(all_equal(&[], &Digest::from_parts(["a"])));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(VotingOutcome::MajorityVoting.as_label(), "majority_voting");
        assert_eq!(VotingOutcome::NoMajority.to_string(), "no_majority");
        assert!(VotingOutcome::NotEnoughElements.is_pending());
        assert!(VotingOutcome::MajorityVoting.is_majority());
    }
}

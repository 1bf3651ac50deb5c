//! Per-task multiset of replica fingerprint submissions.
//!
//! The ledger is the source of truth for quorum math: one live entry per
//! `(task, replica)` pair, with re-submission overwriting. A single-slot
//! "last submitted" accessor is kept as a diagnostic convenience only — the
//! voting decision always consumes the full entry set.
//!
//! The one-shot "first digest" slot is stored independently of the entries,
//! so it survives [`DigestLedger::clear`] and remains available as a stable
//! baseline after a task's working state has been discarded.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use tally_core::{Digest, ReplicaId, TaskId, TaskKind};

use crate::error::Result;
use crate::slot::{poison_err, TaskSlots};

/// One replica's recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestEntry {
    /// The task voted on.
    pub task_id: TaskId,
    /// The replica that submitted the digest.
    pub replica: ReplicaId,
    /// Map or reduce phase of the submitting execution.
    pub kind: TaskKind,
    /// The submitted output fingerprint.
    pub digest: Digest,
}

#[derive(Debug, Default)]
struct LedgerSlot {
    entries: HashMap<ReplicaId, DigestEntry>,
    last: Option<Digest>,
}

/// Per-task store of replica digest submissions.
#[derive(Debug, Default)]
pub struct DigestLedger {
    slots: TaskSlots<LedgerSlot>,
    first: RwLock<HashMap<TaskId, Digest>>,
}

impl DigestLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or overwrites the entry for `(task_id, replica)`.
    ///
    /// Replicas are expected to be deterministic, so overwriting an entry
    /// with a *different* digest is logged as a warning — but accepted: the
    /// latest value participates in subsequent evaluation. Returns true iff
    /// the submission replaced a conflicting digest.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a lock is poisoned.
    pub fn submit(
        &self,
        task_id: &TaskId,
        kind: TaskKind,
        replica: ReplicaId,
        digest: Digest,
    ) -> Result<bool> {
        let (slot, _) = self.slots.get_or_create(task_id)?;
        let mut slot = slot.write().map_err(poison_err)?;

        let conflicted = match slot.entries.get(&replica) {
            Some(previous) if !previous.digest.matches(&digest) => {
                tracing::warn!(
                    task_id = %task_id,
                    replica = %replica,
                    previous = %previous.digest,
                    submitted = %digest,
                    "inconsistent resubmission: replica changed its digest, keeping latest"
                );
                true
            }
            _ => false,
        };

        slot.last = Some(digest.clone());
        slot.entries.insert(
            replica,
            DigestEntry {
                task_id: task_id.clone(),
                replica,
                kind,
                digest,
            },
        );
        Ok(conflicted)
    }

    /// The most recently recorded digest for the task.
    ///
    /// Diagnostic accessor only; never consulted by the voting decision.
    #[must_use]
    pub fn last_submitted(&self, task_id: &TaskId) -> Option<Digest> {
        let slot = self.slots.get(task_id)?;
        let slot = slot.read().ok()?;
        slot.last.clone()
    }

    /// Deletes all entries for the task.
    ///
    /// Returns whether anything was removed. This is the cleanup and
    /// cancellation primitive; the first-digest slot is unaffected.
    #[must_use]
    pub fn clear(&self, task_id: &TaskId) -> bool {
        self.slots
            .remove(task_id)
            .and_then(|slot| slot.read().ok().map(|slot| !slot.entries.is_empty()))
            .unwrap_or(false)
    }

    /// Returns true if no entries remain for the task.
    #[must_use]
    pub fn is_empty(&self, task_id: &TaskId) -> bool {
        self.slots
            .get(task_id)
            .and_then(|slot| slot.read().ok().map(|slot| slot.entries.is_empty()))
            .unwrap_or(true)
    }

    /// Records the set-once baseline digest for the task.
    ///
    /// Later calls for an already-set task id are no-ops. Returns true iff
    /// this call set the slot.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the lock is poisoned.
    pub fn record_first(&self, task_id: &TaskId, digest: Digest) -> Result<bool> {
        let mut first = self.first.write().map_err(poison_err)?;
        match first.entry(task_id.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(task_id = %task_id, "first digest already recorded - no-op");
                Ok(false)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(digest);
                Ok(true)
            }
        }
    }

    /// The baseline digest recorded for the task, if any.
    ///
    /// Survives [`DigestLedger::clear`].
    #[must_use]
    pub fn first_digest(&self, task_id: &TaskId) -> Option<Digest> {
        self.first.read().ok()?.get(task_id).cloned()
    }

    /// Full snapshot of the task's entries, ordered by replica number.
    ///
    /// Consumed by the evaluator; empty if the task id is unknown.
    #[must_use]
    pub fn entries(&self, task_id: &TaskId) -> Vec<DigestEntry> {
        let Some(slot) = self.slots.get(task_id) else {
            return Vec::new();
        };
        let Ok(slot) = slot.read() else {
            return Vec::new();
        };
        let mut entries: Vec<DigestEntry> = slot.entries.values().cloned().collect();
        entries.sort_by_key(|entry| entry.replica);
        entries
    }

    /// Drops all entries and baseline digests (bulk teardown).
    pub fn reset(&self) {
        self.slots.reset();
        if let Ok(mut first) = self.first.write() {
            first.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::JobId;

    fn task(index: u32) -> TaskId {
        TaskId::new(JobId::new("ledger_0001").unwrap(), TaskKind::Reduce, index)
    }

    fn digest(tag: &str) -> Digest {
        Digest::from_parts([tag])
    }

    #[test]
    fn submit_records_one_entry_per_replica() {
        let ledger = DigestLedger::new();
        ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("a"))
            .unwrap();
        ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(1), digest("a"))
            .unwrap();

        let entries = ledger.entries(&task(0));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].replica, ReplicaId::new(0));
        assert_eq!(entries[1].replica, ReplicaId::new(1));
    }

    #[test]
    fn identical_resubmission_is_not_a_conflict() {
        let ledger = DigestLedger::new();
        let conflicted = ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("a"))
            .unwrap();
        assert!(!conflicted);

        let conflicted = ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("a"))
            .unwrap();
        assert!(!conflicted);
        assert_eq!(ledger.entries(&task(0)).len(), 1);
    }

    #[test]
    fn conflicting_resubmission_keeps_latest() {
        let ledger = DigestLedger::new();
        ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("a"))
            .unwrap();
        let conflicted = ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("b"))
            .unwrap();

        assert!(conflicted);
        let entries = ledger.entries(&task(0));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].digest, digest("b"));
    }

    #[test]
    fn last_submitted_tracks_most_recent() {
        let ledger = DigestLedger::new();
        assert!(ledger.last_submitted(&task(0)).is_none());

        ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("a"))
            .unwrap();
        ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(1), digest("b"))
            .unwrap();

        assert_eq!(ledger.last_submitted(&task(0)), Some(digest("b")));
    }

    #[test]
    fn clear_reports_whether_entries_existed() {
        let ledger = DigestLedger::new();
        assert!(!ledger.clear(&task(0)));

        ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("a"))
            .unwrap();
        assert!(ledger.clear(&task(0)));
        assert!(ledger.is_empty(&task(0)));
        assert!(!ledger.clear(&task(0)));
    }

    #[test]
    fn first_digest_is_set_once_and_survives_clear() {
        let ledger = DigestLedger::new();
        assert!(ledger.record_first(&task(0), digest("a")).unwrap());
        assert!(!ledger.record_first(&task(0), digest("b")).unwrap());

        ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("c"))
            .unwrap();
        let _ = ledger.clear(&task(0));

        assert_eq!(ledger.first_digest(&task(0)), Some(digest("a")));
    }

    #[test]
    fn unknown_task_is_empty() {
        let ledger = DigestLedger::new();
        assert!(ledger.is_empty(&task(9)));
        assert!(ledger.entries(&task(9)).is_empty());
        assert!(ledger.first_digest(&task(9)).is_none());
    }

    #[test]
    fn reset_drops_baselines_too() {
        let ledger = DigestLedger::new();
        ledger.record_first(&task(0), digest("a")).unwrap();
        ledger
            .submit(&task(0), TaskKind::Reduce, ReplicaId::new(0), digest("a"))
            .unwrap();

        ledger.reset();

        assert!(ledger.is_empty(&task(0)));
        assert!(ledger.first_digest(&task(0)).is_none());
    }
}

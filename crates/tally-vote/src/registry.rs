//! The voting registry: single owner of all per-job voting state.
//!
//! One registry is constructed per job and torn down with it. Every
//! collaborator — the tracker registering tasks, the completion handlers
//! pushing events and digests, the commit logic querying decisions — goes
//! through this facade; nothing else holds references into the underlying
//! stores, so there is a single source of truth for quorum decisions.
//!
//! Mutations are atomic per task id and isolated per task id (see
//! [`crate::slot`]); no operation blocks waiting for quorum and none
//! suspends. Callers decide when to time out and remediate via
//! [`VotingRegistry::task_pending_without_majority`].

use std::collections::HashMap;
use std::sync::RwLock;

use tally_core::{Digest, ReplicaId, ReplicaTaskId, TaskId, TaskKind};

use crate::completion_log::CompletionEventStore;
use crate::config::VotingConfig;
use crate::error::Result;
use crate::evaluator::{self, VotingOutcome};
use crate::events::TaskCompletionEvent;
use crate::ledger::{DigestEntry, DigestLedger};
use crate::metrics::VoteMetrics;
use crate::replica_index::ReplicaIndex;
use crate::slot::poison_err;

/// Quorum voting state for one job.
#[derive(Debug, Default)]
pub struct VotingRegistry {
    config: VotingConfig,
    index: ReplicaIndex,
    ledger: DigestLedger,
    events: CompletionEventStore,
    outcomes: RwLock<HashMap<TaskId, VotingOutcome>>,
    metrics: VoteMetrics,
}

impl VotingRegistry {
    /// Creates a registry for a job with the given replication factor.
    #[must_use]
    pub fn new(config: VotingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The voting configuration for this job.
    #[must_use]
    pub const fn config(&self) -> &VotingConfig {
        &self.config
    }

    /// The majority threshold for the configured replication factor.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.config.threshold()
    }

    // --- ReplicaIndex surface ---

    /// Count of base task ids resolved as successful.
    #[must_use]
    pub fn resolved_len(&self) -> usize {
        self.index.resolved_len()
    }

    /// Registers a task id for voting; idempotent.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a lock is poisoned.
    pub fn register_task(&self, task_id: &TaskId) -> Result<()> {
        self.index.register_task(task_id)?;
        self.metrics.set_tracked_tasks(self.index.tracked_len());
        Ok(())
    }

    /// Appends a replica number for the task, auto-registering it if unknown.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a lock is poisoned.
    pub fn add_replica(&self, task_id: &TaskId, replica: ReplicaId) -> Result<()> {
        self.index.add_replica(task_id, replica)?;
        self.metrics.set_tracked_tasks(self.index.tracked_len());
        Ok(())
    }

    /// Replica numbers known for the task, in insertion order.
    #[must_use]
    pub fn replicas(&self, task_id: &TaskId) -> Vec<ReplicaId> {
        self.index.replicas(task_id)
    }

    // --- DigestLedger surface ---

    /// Records a replica's digest submission for the task.
    ///
    /// The task is auto-registered so it becomes visible to
    /// [`VotingRegistry::task_pending_without_majority`] even if the tracker
    /// never registered it explicitly. An inconsistent resubmission (same
    /// replica, different digest) is accepted with a warning; the latest
    /// value participates in future evaluations.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a lock is poisoned.
    #[tracing::instrument(skip(self, digest), fields(task_id = %task_id, replica = %replica))]
    pub fn submit_digest(
        &self,
        task_id: &TaskId,
        kind: TaskKind,
        replica: ReplicaId,
        digest: Digest,
    ) -> Result<()> {
        self.index.register_task(task_id)?;
        let conflicted = self.ledger.submit(task_id, kind, replica, digest)?;
        self.metrics.record_submission(kind);
        if conflicted {
            self.metrics.record_resubmission_conflict();
        }
        Ok(())
    }

    /// The most recently recorded digest for the task (diagnostic only).
    #[must_use]
    pub fn last_submitted(&self, task_id: &TaskId) -> Option<Digest> {
        self.ledger.last_submitted(task_id)
    }

    /// Deletes all ledger entries for the task; returns whether anything
    /// was removed.
    ///
    /// Invoked after a decision has been finalized by the caller; the
    /// first-digest baseline and the resolved accounting survive.
    #[tracing::instrument(skip(self), fields(task_id = %task_id))]
    pub fn clear(&self, task_id: &TaskId) -> bool {
        self.ledger.clear(task_id)
    }

    /// Returns true if no ledger entries remain for the task.
    #[must_use]
    pub fn is_empty(&self, task_id: &TaskId) -> bool {
        self.ledger.is_empty(task_id)
    }

    /// Records the set-once baseline digest for the task.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the lock is poisoned.
    pub fn record_first_digest(&self, task_id: &TaskId, digest: Digest) -> Result<bool> {
        self.ledger.record_first(task_id, digest)
    }

    /// The baseline digest recorded for the task, if any.
    #[must_use]
    pub fn first_digest(&self, task_id: &TaskId) -> Option<Digest> {
        self.ledger.first_digest(task_id)
    }

    /// Snapshot of the task's ledger entries, ordered by replica number.
    #[must_use]
    pub fn entries(&self, task_id: &TaskId) -> Vec<DigestEntry> {
        self.ledger.entries(task_id)
    }

    // --- CompletionEventStore surface ---

    /// Appends a completion event to the task's arrival-order log.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a lock is poisoned.
    pub fn append_event(&self, task_id: &TaskId, event: TaskCompletionEvent) -> Result<()> {
        self.events.append(task_id, event)
    }

    /// Defensive snapshot of the task's completion events.
    #[must_use]
    pub fn events(&self, task_id: &TaskId) -> Vec<TaskCompletionEvent> {
        self.events.events(task_id)
    }

    /// Records the first arrival for the event's base task id; first wins
    /// globally.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the lock is poisoned.
    pub fn record_first_arrival(&self, event: TaskCompletionEvent) -> Result<bool> {
        self.events.record_first_arrival(event)
    }

    /// The first-arrival event recorded for the task, if any.
    #[must_use]
    pub fn first_arrival(&self, task_id: &TaskId) -> Option<TaskCompletionEvent> {
        self.events.first_arrival(task_id)
    }

    /// Replica-qualified identities known for the task.
    #[must_use]
    pub fn replica_task_ids(&self, task_id: &TaskId) -> Vec<ReplicaTaskId> {
        self.events.replica_task_ids(task_id, &self.index)
    }

    // --- VotingEvaluator surface ---

    /// Computes the quorum decision for the task from the current ledger.
    ///
    /// Records the outcome for remediation queries and, on the first
    /// transition into majority, increments the resolved-success count —
    /// exactly once per task id, however many times `evaluate` is called.
    ///
    /// An unregistered or cleared task evaluates to
    /// [`VotingOutcome::NotEnoughElements`]; so does a task whose state is
    /// unreachable because of an internal fault — a degraded answer, never
    /// a crash.
    #[tracing::instrument(skip(self), fields(task_id = %task_id))]
    pub fn evaluate(&self, task_id: &TaskId) -> VotingOutcome {
        let entries = self.ledger.entries(task_id);
        let outcome = evaluator::evaluate(&entries, self.config.threshold());
        self.metrics.record_evaluation(outcome);

        if let Ok(mut outcomes) = self.outcomes.write() {
            outcomes.insert(task_id.clone(), outcome);
        }

        if outcome.is_majority() && self.index.mark_resolved(task_id).unwrap_or(false) {
            tracing::debug!(
                task_id = %task_id,
                agreeing = evaluator::largest_agreeing_group(&entries),
                threshold = self.config.threshold(),
                "task resolved by majority vote"
            );
        }

        outcome
    }

    /// Returns true iff every ledger entry for the task equals `digest`.
    #[must_use]
    pub fn all_equal(&self, task_id: &TaskId, digest: &Digest) -> bool {
        evaluator::all_equal(&self.ledger.entries(task_id), digest)
    }

    /// A tracked, unresolved task whose last evaluation was not a majority.
    ///
    /// Selection is deterministic: earliest-registered-first. A tracked task
    /// that has never been evaluated qualifies (its evaluation could only be
    /// deferred). Returns `None` if no task qualifies — everything tracked
    /// has resolved.
    #[must_use]
    pub fn task_pending_without_majority(&self) -> Option<TaskId> {
        let outcomes = self.outcomes.read().ok()?;
        self.index
            .registration_order()
            .into_iter()
            .find(|task_id| {
                !self.index.is_resolved(task_id)
                    && !matches!(outcomes.get(task_id), Some(VotingOutcome::MajorityVoting))
            })
    }

    /// Drops all voting state (bulk teardown at job completion).
    ///
    /// # Errors
    ///
    /// Returns an internal error if the outcome lock is poisoned.
    pub fn reset(&self) -> Result<()> {
        self.index.reset();
        self.ledger.reset();
        self.events.reset();
        self.outcomes.write().map_err(poison_err)?.clear();
        self.metrics.set_tracked_tasks(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CompletionStatus;
    use tally_core::JobId;

    fn registry(n: usize) -> VotingRegistry {
        VotingRegistry::new(VotingConfig::new(n).unwrap())
    }

    fn task(index: u32) -> TaskId {
        TaskId::new(JobId::new("reg_0001").unwrap(), TaskKind::Reduce, index)
    }

    fn digest(tag: &str) -> Digest {
        Digest::from_parts([tag])
    }

    fn submit(reg: &VotingRegistry, index: u32, replica: u32, tag: &str) {
        reg.submit_digest(
            &task(index),
            TaskKind::Reduce,
            ReplicaId::new(replica),
            digest(tag),
        )
        .unwrap();
    }

    #[test]
    fn majority_reached_at_threshold() {
        let reg = registry(5);
        submit(&reg, 0, 0, "d");
        submit(&reg, 0, 1, "d");
        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::NotEnoughElements);

        submit(&reg, 0, 2, "d");
        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::MajorityVoting);
        assert_eq!(reg.resolved_len(), 1);
    }

    #[test]
    fn resolved_count_increments_once_per_task() {
        let reg = registry(3);
        submit(&reg, 0, 0, "d");
        submit(&reg, 0, 1, "d");

        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::MajorityVoting);
        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::MajorityVoting);
        assert_eq!(reg.resolved_len(), 1);
    }

    #[test]
    fn no_majority_is_not_terminal() {
        let reg = registry(3);
        submit(&reg, 0, 0, "a");
        submit(&reg, 0, 1, "b");
        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::NoMajority);

        // An extra replica agreeing with "a" flips the decision.
        submit(&reg, 0, 2, "a");
        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::MajorityVoting);
    }

    #[test]
    fn evaluate_after_clear_defers() {
        let reg = registry(3);
        submit(&reg, 0, 0, "d");
        submit(&reg, 0, 1, "d");
        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::MajorityVoting);

        assert!(reg.clear(&task(0)));
        assert!(reg.is_empty(&task(0)));
        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::NotEnoughElements);
    }

    #[test]
    fn pending_without_majority_prefers_earliest_registered() {
        let reg = registry(3);
        reg.register_task(&task(5)).unwrap();
        reg.register_task(&task(1)).unwrap();

        // task 5 registered first and has no majority yet.
        assert_eq!(reg.task_pending_without_majority(), Some(task(5)));

        submit(&reg, 5, 0, "d");
        submit(&reg, 5, 1, "d");
        assert_eq!(reg.evaluate(&task(5)), VotingOutcome::MajorityVoting);

        assert_eq!(reg.task_pending_without_majority(), Some(task(1)));
    }

    #[test]
    fn pending_without_majority_none_when_all_resolved() {
        let reg = registry(1);
        submit(&reg, 0, 0, "d");
        assert_eq!(reg.evaluate(&task(0)), VotingOutcome::MajorityVoting);
        assert_eq!(reg.task_pending_without_majority(), None);
    }

    #[test]
    fn all_equal_through_facade() {
        let reg = registry(3);
        submit(&reg, 0, 0, "d");
        submit(&reg, 0, 1, "d");
        assert!(reg.all_equal(&task(0), &digest("d")));
        assert!(!reg.all_equal(&task(0), &digest("x")));
        assert!(!reg.all_equal(&task(0), &Digest::from_parts(["d", "d"])));
    }

    #[test]
    fn completion_events_flow_through_facade() {
        let reg = registry(3);
        reg.add_replica(&task(0), ReplicaId::new(0)).unwrap();
        reg.add_replica(&task(0), ReplicaId::new(1)).unwrap();

        let event = TaskCompletionEvent::new(
            task(0).replica(ReplicaId::new(1)),
            CompletionStatus::Succeeded,
        );
        reg.append_event(&task(0), event.clone()).unwrap();
        assert!(reg.record_first_arrival(event.clone()).unwrap());

        assert_eq!(reg.events(&task(0)), vec![event.clone()]);
        assert_eq!(reg.first_arrival(&task(0)).unwrap().event_id, event.event_id);
        assert_eq!(
            reg.replica_task_ids(&task(0)),
            vec![
                task(0).replica(ReplicaId::new(0)),
                task(0).replica(ReplicaId::new(1)),
            ]
        );
    }

    #[test]
    fn reset_tears_down_everything() {
        let reg = registry(3);
        submit(&reg, 0, 0, "d");
        submit(&reg, 0, 1, "d");
        reg.evaluate(&task(0));
        reg.record_first_digest(&task(0), digest("d")).unwrap();

        reg.reset().unwrap();

        assert_eq!(reg.resolved_len(), 0);
        assert!(reg.is_empty(&task(0)));
        assert!(reg.first_digest(&task(0)).is_none());
        assert_eq!(reg.task_pending_without_majority(), None);
    }
}

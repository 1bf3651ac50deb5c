//! Index of known replicas and resolved tasks.
//!
//! Tracks, per base task id, which replica numbers have been launched, the
//! order in which tasks were first registered, and the one-shot "resolved by
//! majority" transition that feeds the success count.

use std::collections::HashSet;
use std::sync::RwLock;

use tally_core::{ReplicaId, TaskId};

use crate::error::Result;
use crate::slot::{poison_err, TaskSlots};

/// Tracks which replica numbers are known per base task id.
///
/// Registration is permissive by design: `add_replica` on an unknown task id
/// auto-registers it, because the scheduler and the completion callbacks race
/// and absence of prior registration is not an error.
#[derive(Debug, Default)]
pub struct ReplicaIndex {
    replicas: TaskSlots<Vec<ReplicaId>>,
    order: RwLock<Vec<TaskId>>,
    resolved: RwLock<HashSet<TaskId>>,
}

impl ReplicaIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of base task ids resolved as successful (reached majority).
    ///
    /// Monotonically non-decreasing until [`ReplicaIndex::reset`].
    #[must_use]
    pub fn resolved_len(&self) -> usize {
        self.resolved.read().map(|set| set.len()).unwrap_or(0)
    }

    /// Number of task ids currently tracked.
    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.order.read().map(|order| order.len()).unwrap_or(0)
    }

    /// Registers a task id, creating an empty replica set if absent.
    ///
    /// Idempotent: re-registration is a no-op and the task keeps its
    /// original position in the registration order.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a lock is poisoned.
    pub fn register_task(&self, task_id: &TaskId) -> Result<()> {
        self.ensure_registered(task_id).map(|_| ())
    }

    /// Appends a replica number to the set for the task.
    ///
    /// Auto-registers the task id if unknown.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a lock is poisoned.
    pub fn add_replica(&self, task_id: &TaskId, replica: ReplicaId) -> Result<()> {
        let slot = self.ensure_registered(task_id)?;
        slot.write().map_err(poison_err)?.push(replica);
        Ok(())
    }

    /// Replica numbers known for the task, in insertion order.
    ///
    /// Empty if the task id is unknown.
    #[must_use]
    pub fn replicas(&self, task_id: &TaskId) -> Vec<ReplicaId> {
        self.replicas
            .get(task_id)
            .and_then(|slot| slot.read().ok().map(|set| set.clone()))
            .unwrap_or_default()
    }

    /// Returns true if the task id has been registered.
    #[must_use]
    pub fn is_registered(&self, task_id: &TaskId) -> bool {
        self.replicas.contains(task_id)
    }

    /// Task ids in the order they were first registered.
    #[must_use]
    pub fn registration_order(&self) -> Vec<TaskId> {
        self.order
            .read()
            .map(|order| order.clone())
            .unwrap_or_default()
    }

    /// Records the one-shot transition of a task into resolved-by-majority.
    ///
    /// Returns true only on the first call per task id, so the caller can
    /// increment success accounting exactly once.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the lock is poisoned.
    pub fn mark_resolved(&self, task_id: &TaskId) -> Result<bool> {
        let mut resolved = self.resolved.write().map_err(poison_err)?;
        Ok(resolved.insert(task_id.clone()))
    }

    /// Returns true if the task has been resolved by majority.
    #[must_use]
    pub fn is_resolved(&self, task_id: &TaskId) -> bool {
        self.resolved
            .read()
            .map(|set| set.contains(task_id))
            .unwrap_or(false)
    }

    /// Drops all tracked state (bulk teardown at job completion).
    pub fn reset(&self) {
        self.replicas.reset();
        if let Ok(mut order) = self.order.write() {
            order.clear();
        }
        if let Ok(mut resolved) = self.resolved.write() {
            resolved.clear();
        }
    }

    fn ensure_registered(
        &self,
        task_id: &TaskId,
    ) -> Result<std::sync::Arc<RwLock<Vec<ReplicaId>>>> {
        let (slot, created) = self.replicas.get_or_create(task_id)?;
        if created {
            self.order.write().map_err(poison_err)?.push(task_id.clone());
            tracing::debug!(task_id = %task_id, "task registered for voting");
        }
        Ok(slot)
    }
}

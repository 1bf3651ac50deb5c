//! Append-only per-task log of completion notifications.
//!
//! Events are stored in arrival order; arrival order is **not** guaranteed
//! to reflect actual execution completion order, since notifications travel
//! over independent asynchronous paths. Alongside the log, the store keeps a
//! one-shot "first arrival" record per base task id that survives everything
//! short of a full reset.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use tally_core::{ReplicaTaskId, TaskId};

use crate::error::Result;
use crate::events::TaskCompletionEvent;
use crate::replica_index::ReplicaIndex;
use crate::slot::{poison_err, TaskSlots};

/// Per-task store of completion events.
#[derive(Debug, Default)]
pub struct CompletionEventStore {
    logs: TaskSlots<Vec<TaskCompletionEvent>>,
    first: RwLock<HashMap<TaskId, TaskCompletionEvent>>,
}

impl CompletionEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the task's log, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a lock is poisoned.
    pub fn append(&self, task_id: &TaskId, event: TaskCompletionEvent) -> Result<()> {
        let (slot, _) = self.logs.get_or_create(task_id)?;
        slot.write().map_err(poison_err)?.push(event);
        Ok(())
    }

    /// Defensive snapshot of the task's event log.
    ///
    /// Callers must not assume visibility of later mutations. Empty if the
    /// task id is unknown.
    #[must_use]
    pub fn events(&self, task_id: &TaskId) -> Vec<TaskCompletionEvent> {
        self.logs
            .get(task_id)
            .and_then(|slot| slot.read().ok().map(|log| log.clone()))
            .unwrap_or_default()
    }

    /// Records the first arrival for the event's base task id.
    ///
    /// First arrival per base task id wins globally: once a task id has a
    /// recorded first-arrival event, subsequent calls are no-ops regardless
    /// of which replica they represent. Returns true iff this event won the
    /// slot.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the lock is poisoned.
    pub fn record_first_arrival(&self, event: TaskCompletionEvent) -> Result<bool> {
        let mut first = self.first.write().map_err(poison_err)?;
        match first.entry(event.task_id().clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(
                    task_id = %event.task_id(),
                    replica = %event.replica(),
                    "first arrival already recorded - no-op"
                );
                Ok(false)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(event);
                Ok(true)
            }
        }
    }

    /// The first-arrival event recorded for the task, if any.
    #[must_use]
    pub fn first_arrival(&self, task_id: &TaskId) -> Option<TaskCompletionEvent> {
        self.first.read().ok()?.get(task_id).cloned()
    }

    /// Replica-qualified identities known for a base task id.
    ///
    /// Cross-references the replica index; empty if the task is unknown.
    #[must_use]
    pub fn replica_task_ids(&self, task_id: &TaskId, index: &ReplicaIndex) -> Vec<ReplicaTaskId> {
        index
            .replicas(task_id)
            .into_iter()
            .map(|replica| task_id.replica(replica))
            .collect()
    }

    /// Drops all logs and first-arrival records (bulk teardown).
    pub fn reset(&self) {
        self.logs.reset();
        if let Ok(mut first) = self.first.write() {
            first.clear();
        }
    }
}

//! Per-task locked slots.
//!
//! Completion notifications for unrelated tasks must never contend, so state
//! is held behind two levels of locking: an outer `RwLock<HashMap>` that is
//! only held long enough to locate or create a task's slot, and an inner
//! per-task `RwLock` guarding the actual state. Mutations for one task
//! serialize on the inner lock; mutations for different tasks proceed in
//! parallel.
//!
//! Poisoning policy: mutators surface a poisoned lock as
//! `Error::Internal`; read paths degrade to "no state" instead, so a
//! panicked writer elsewhere can never take down a caller that is merely
//! asking a question.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tally_core::TaskId;

use crate::error::{Error, Result};

/// Converts a lock poison error to an internal error.
pub(crate) fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::internal("lock poisoned")
}

/// A map of per-task slots, each individually locked.
#[derive(Debug, Default)]
pub(crate) struct TaskSlots<T> {
    slots: RwLock<HashMap<TaskId, Arc<RwLock<T>>>>,
}

impl<T: Default> TaskSlots<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the existing slot for the task, if any.
    pub(crate) fn get(&self, task_id: &TaskId) -> Option<Arc<RwLock<T>>> {
        let slots = self.slots.read().ok()?;
        slots.get(task_id).cloned()
    }

    /// Returns the slot for the task, creating an empty one if absent.
    ///
    /// The boolean is true iff this call created the slot. Creation is
    /// atomic under the outer write lock, so exactly one caller observes
    /// `true` per task.
    pub(crate) fn get_or_create(&self, task_id: &TaskId) -> Result<(Arc<RwLock<T>>, bool)> {
        {
            let slots = self.slots.read().map_err(poison_err)?;
            if let Some(slot) = slots.get(task_id) {
                return Ok((Arc::clone(slot), false));
            }
        }

        let mut slots = self.slots.write().map_err(poison_err)?;
        match slots.entry(task_id.clone()) {
            Entry::Occupied(occupied) => Ok((Arc::clone(occupied.get()), false)),
            Entry::Vacant(vacant) => {
                let slot = Arc::new(RwLock::new(T::default()));
                vacant.insert(Arc::clone(&slot));
                Ok((slot, true))
            }
        }
    }

    /// Removes and returns the slot for the task.
    ///
    /// A writer racing with the removal may still complete against the
    /// detached slot; that last-writer-wins outcome is the documented
    /// cancellation semantics.
    pub(crate) fn remove(&self, task_id: &TaskId) -> Option<Arc<RwLock<T>>> {
        self.slots.write().ok()?.remove(task_id)
    }

    /// Returns true if a slot exists for the task.
    pub(crate) fn contains(&self, task_id: &TaskId) -> bool {
        self.slots
            .read()
            .map(|slots| slots.contains_key(task_id))
            .unwrap_or(false)
    }

    /// Drops every slot.
    pub(crate) fn reset(&self) {
        if let Ok(mut slots) = self.slots.write() {
            slots.clear();
        }
    }
}

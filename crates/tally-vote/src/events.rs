//! Completion events reported by replica executions.
//!
//! Events arrive over independent asynchronous paths, one per replica
//! callback, so arrival order is **not** guaranteed to reflect actual
//! execution completion order. Each event carries a ULID identifier:
//! ULIDs are lexicographically sortable by creation time, which keeps the
//! arrival log orderable as plain strings without a separate sequence field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use tally_core::{ReplicaId, ReplicaTaskId, TaskId};

/// Completion status reported for one replica execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    /// The replica finished and produced output.
    Succeeded,
    /// The replica finished with an error.
    Failed,
    /// The replica was killed by the scheduler.
    Killed,
    /// The replica's result was superseded before it was consumed.
    Obsolete,
}

impl CompletionStatus {
    /// Returns true if the replica produced consumable output.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns a lowercase label suitable for metrics and logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Killed => "killed",
            Self::Obsolete => "obsolete",
        }
    }
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Raw completion notification delivered by the scheduler.
///
/// Immutable once stored; the voting core treats everything beyond the
/// replica identity as opaque bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionEvent {
    /// Unique event identifier (ULID).
    pub event_id: String,
    /// The replica execution this event reports on.
    pub replica_task_id: ReplicaTaskId,
    /// Reported completion status.
    pub status: CompletionStatus,
    /// When the event was created.
    pub occurred_at: DateTime<Utc>,
}

impl TaskCompletionEvent {
    /// Creates a new event with an auto-generated ID and current timestamp.
    #[must_use]
    pub fn new(replica_task_id: ReplicaTaskId, status: CompletionStatus) -> Self {
        Self::new_with_timestamp(replica_task_id, status, Utc::now())
    }

    /// Creates a new event with an explicit timestamp (for deterministic tests).
    #[must_use]
    pub fn new_with_timestamp(
        replica_task_id: ReplicaTaskId,
        status: CompletionStatus,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            replica_task_id,
            status,
            occurred_at,
        }
    }

    /// The replica-independent task identity this event belongs to.
    #[must_use]
    pub fn task_id(&self) -> &TaskId {
        &self.replica_task_id.base
    }

    /// The replica that produced this event.
    #[must_use]
    pub fn replica(&self) -> ReplicaId {
        self.replica_task_id.replica
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{JobId, TaskKind};

    fn replica_task(index: u32, replica: u32) -> ReplicaTaskId {
        let job = JobId::new("test_0001").unwrap();
        TaskId::new(job, TaskKind::Reduce, index).replica(ReplicaId::new(replica))
    }

    #[test]
    fn event_ids_are_unique() {
        let a = TaskCompletionEvent::new(replica_task(0, 0), CompletionStatus::Succeeded);
        let b = TaskCompletionEvent::new(replica_task(0, 1), CompletionStatus::Succeeded);
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn event_exposes_base_identity() {
        let event = TaskCompletionEvent::new(replica_task(3, 2), CompletionStatus::Killed);
        assert_eq!(event.task_id().index, 3);
        assert_eq!(event.replica(), ReplicaId::new(2));
        assert!(!event.status.is_success());
    }

    #[test]
    fn status_labels() {
        assert_eq!(CompletionStatus::Succeeded.as_label(), "succeeded");
        assert_eq!(CompletionStatus::Obsolete.to_string(), "obsolete");
    }

    #[test]
    fn event_serializes_camel_case() {
        let event = TaskCompletionEvent::new(replica_task(0, 0), CompletionStatus::Succeeded);
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("eventId").is_some());
        assert!(json.get("replicaTaskId").is_some());
        assert_eq!(json["status"], "SUCCEEDED");
    }
}

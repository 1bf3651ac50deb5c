//! Observability metrics for the voting engine.
//!
//! Exposed via the `metrics` crate facade; install any compatible recorder
//! (e.g. a Prometheus exporter) in the host process to export them.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `tally_vote_submissions_total` | Counter | `kind` | Digest submissions recorded |
//! | `tally_vote_evaluations_total` | Counter | `outcome` | Quorum evaluations by outcome |
//! | `tally_vote_resubmission_conflicts_total` | Counter | - | Replicas that changed their digest |
//! | `tally_vote_tracked_tasks` | Gauge | - | Task ids currently tracked |

use metrics::{counter, gauge};

use tally_core::TaskKind;

use crate::evaluator::VotingOutcome;

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: Digest submissions recorded.
    pub const SUBMISSIONS_TOTAL: &str = "tally_vote_submissions_total";
    /// Counter: Quorum evaluations by outcome.
    pub const EVALUATIONS_TOTAL: &str = "tally_vote_evaluations_total";
    /// Counter: Replicas that changed their digest on resubmission.
    pub const RESUBMISSION_CONFLICTS_TOTAL: &str = "tally_vote_resubmission_conflicts_total";
    /// Gauge: Task ids currently tracked.
    pub const TRACKED_TASKS: &str = "tally_vote_tracked_tasks";
}

/// Label keys used across metrics.
pub mod labels {
    /// Evaluation outcome label.
    pub const OUTCOME: &str = "outcome";
    /// Task kind label (map or reduce).
    pub const KIND: &str = "kind";
}

/// Metrics recorder for voting operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteMetrics;

impl VoteMetrics {
    /// Creates the metrics recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Records one digest submission.
    pub fn record_submission(&self, kind: TaskKind) {
        let kind_label = match kind {
            TaskKind::Map => "map",
            TaskKind::Reduce => "reduce",
        };
        counter!(names::SUBMISSIONS_TOTAL, labels::KIND => kind_label).increment(1);
    }

    /// Records one quorum evaluation and its outcome.
    pub fn record_evaluation(&self, outcome: VotingOutcome) {
        counter!(names::EVALUATIONS_TOTAL, labels::OUTCOME => outcome.as_label()).increment(1);
    }

    /// Records a replica resubmitting a different digest.
    pub fn record_resubmission_conflict(&self) {
        counter!(names::RESUBMISSION_CONFLICTS_TOTAL).increment(1);
    }

    /// Updates the tracked-task gauge.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_tracked_tasks(&self, count: usize) {
        gauge!(names::TRACKED_TASKS).set(count as f64);
    }
}

use std::fmt;

use chrono::{DateTime, Utc};

use super::artifact::Artifact;

/// Terminal status of one task execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Failed,
    TimedOut,
    Skipped,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::TimedOut => "TimedOut",
            Self::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

/// Record of one task execution. Produced exactly once per registered task
/// and immutable afterwards.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error: Option<String>,
    pub artifact: Option<Artifact>,
}

impl TaskOutcome {
    pub fn success(
        task_id: impl Into<String>,
        started_at: DateTime<Utc>,
        artifact: Artifact,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Success,
            started_at,
            finished_at: Utc::now(),
            error: None,
            artifact: Some(artifact),
        }
    }

    pub fn failed(
        task_id: impl Into<String>,
        started_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            started_at,
            finished_at: Utc::now(),
            error: Some(reason.into()),
            artifact: None,
        }
    }

    pub fn timed_out(
        task_id: impl Into<String>,
        started_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::TimedOut,
            started_at,
            finished_at: Utc::now(),
            error: Some(reason.into()),
            artifact: None,
        }
    }

    pub fn skipped(task_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Skipped,
            started_at: now,
            finished_at: now,
            error: Some(reason.into()),
            artifact: None,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Status counts across an outcome set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub success: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub skipped: usize,
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Success, {} Failed, {} TimedOut, {} Skipped",
            self.success, self.failed, self.timed_out, self.skipped
        )
    }
}

/// Ordered mapping of task id to outcome.
///
/// Insertion order is execution order; the coordinator re-sorts to
/// registration order at its join point so downstream reporting is
/// deterministic regardless of completion order.
#[derive(Debug, Clone, Default)]
pub struct OutcomeSet {
    outcomes: Vec<TaskOutcome>,
}

impl OutcomeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome. Each task writes its entry exactly once; a second
    /// write for the same id is a coordinator bug and is dropped with a log.
    pub fn push(&mut self, outcome: TaskOutcome) {
        if self.get(&outcome.task_id).is_some() {
            tracing::error!(task_id = %outcome.task_id, "duplicate outcome dropped");
            return;
        }
        self.outcomes.push(outcome);
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.task_id == task_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for outcome in &self.outcomes {
            match outcome.status {
                TaskStatus::Success => counts.success += 1,
                TaskStatus::Failed => counts.failed += 1,
                TaskStatus::TimedOut => counts.timed_out += 1,
                TaskStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    /// Re-sort to the given registration order. Ids absent from `order`
    /// would indicate a registry mismatch and are kept at the tail.
    pub fn into_registration_order(mut self, order: &[String]) -> Self {
        self.outcomes.sort_by_key(|o| {
            order
                .iter()
                .position(|id| *id == o.task_id)
                .unwrap_or(usize::MAX)
        });
        self
    }
}

impl IntoIterator for OutcomeSet {
    type Item = TaskOutcome;
    type IntoIter = std::vec::IntoIter<TaskOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

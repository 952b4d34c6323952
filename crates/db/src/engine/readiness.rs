//! Ready task detection and ranking
//!
//! A task is ready when it is `todo` and everything it depends on is
//! `completed`. Ready tasks are ranked by priority, then by how many open
//! tasks they unblock, then by how quickly they can be finished.

use serde::Serialize;

use crate::engine::TaskSummary;
use crate::engine::snapshot::GraphSnapshot;
use crate::error::{DbError, DbResult};
use crate::models::{Status, Task, display_id_order};
use crate::repository::TaskFilter;

/// Score contributed per priority rank (low 1, medium 2, high 3)
pub const PRIORITY_WEIGHT: f64 = 1000.0;
/// Score contributed per open dependent
pub const DEPENDENT_WEIGHT: f64 = 10.0;
/// Dependents beyond this count add nothing, so they never outrank priority
pub const DEPENDENT_CAP: usize = 99;
/// Largest quick-win bonus, given to a zero-hour estimate
pub const QUICK_WIN_BONUS: f64 = 9.0;

/// Filters and limit for a readiness scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadyQuery {
    pub category: Option<String>,
    pub assignee: Option<String>,
    /// Maximum number of results; `None` is unbounded
    pub limit: Option<usize>,
}

impl ReadyQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reject parameters that can never produce a result.
    pub fn validate(&self) -> DbResult<()> {
        if self.limit == Some(0) {
            return Err(DbError::invalid_parameter("limit", "must be at least 1"));
        }
        Ok(())
    }

    /// Store filter selecting the candidates for this query
    pub fn filter(&self) -> TaskFilter {
        let mut filter = TaskFilter::new().with_status(Status::Todo);
        if let Some(category) = &self.category {
            filter = filter.with_category(category.clone());
        }
        if let Some(assignee) = &self.assignee {
            filter = filter.with_assignee(assignee.clone());
        }
        filter
    }
}

/// A ready task with its ranking inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyTask {
    #[serde(flatten)]
    pub task: TaskSummary,
    pub priority_score: f64,
    pub dependents_count: usize,
}

/// Whether `id` is `todo` with every resolvable dependency completed.
pub fn is_ready(snapshot: &GraphSnapshot, id: &str) -> bool {
    let Some(task) = snapshot.task(id) else {
        return false;
    };
    task.status == Status::Todo
        && snapshot
            .dependencies(id)
            .iter()
            .filter_map(|dep| snapshot.task(dep))
            .all(|dep| dep.status.satisfies_dependency())
}

/// Direct dependents of `id` that are still open
pub fn open_dependents(snapshot: &GraphSnapshot, id: &str) -> usize {
    snapshot
        .dependents(id)
        .iter()
        .filter_map(|dependent| snapshot.task(dependent))
        .filter(|dependent| !dependent.status.is_terminal())
        .count()
}

/// Ranking score.
///
/// `rank * 1000 + min(dependents, 99) * 10 + 9 / (1 + hours)`. Each term is
/// bounded below the step of the one before it, so priority always wins,
/// then dependents, then the shorter estimate. No estimate earns no bonus.
pub fn priority_score(task: &Task, dependents: usize) -> f64 {
    let quick_win = task
        .estimated_hours
        .map(|hours| QUICK_WIN_BONUS / (1.0 + hours.max(0.0)))
        .unwrap_or(0.0);
    f64::from(task.priority.rank()) * PRIORITY_WEIGHT
        + dependents.min(DEPENDENT_CAP) as f64 * DEPENDENT_WEIGHT
        + quick_win
}

/// Score and order the ready tasks among `candidates`.
///
/// Highest score first; equal scores fall back to display ID.
pub fn rank_ready<'a>(
    snapshot: &GraphSnapshot,
    candidates: impl IntoIterator<Item = &'a str>,
    limit: Option<usize>,
) -> Vec<ReadyTask> {
    let mut ready: Vec<ReadyTask> = candidates
        .into_iter()
        .filter(|id| is_ready(snapshot, id))
        .filter_map(|id| {
            let task = snapshot.task(id)?;
            let dependents_count = open_dependents(snapshot, id);
            Some(ReadyTask {
                task: TaskSummary::from_task(id, task),
                priority_score: priority_score(task, dependents_count),
                dependents_count,
            })
        })
        .collect();

    ready.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| {
                display_id_order(&a.task.display_id).cmp(&display_id_order(&b.task.display_id))
            })
    });
    ready.dedup_by(|a, b| a.task.id == b.task.id);

    if let Some(limit) = limit {
        ready.truncate(limit);
    }
    ready
}

//! Store boundary consumed by the graph engine
//!
//! The engine never talks to SurrealDB directly. It reads tasks and edges
//! through [`TaskStore`], which [`Database`] implements on top of the
//! repositories and [`GraphSnapshot`] implements in memory.

use std::future::Future;

use crate::Database;
use crate::engine::snapshot::GraphSnapshot;
use crate::error::DbResult;
use crate::models::{Task, display_id_order};
use crate::repository::TaskFilter;

/// Read-only access to tasks and their graph edges.
///
/// Ids are record keys (`abc123` for `task:abc123`). Edge listings may
/// name tasks that no longer exist; callers are expected to skip them.
pub trait TaskStore {
    /// Fetch one task, `None` if it does not exist
    fn get_task(&self, id: &str) -> impl Future<Output = DbResult<Option<Task>>> + Send;

    /// Ids of the tasks that `id` depends on
    fn list_dependencies(&self, id: &str) -> impl Future<Output = DbResult<Vec<String>>> + Send;

    /// Ids of the tasks that depend on `id`
    fn list_dependents(&self, id: &str) -> impl Future<Output = DbResult<Vec<String>>> + Send;

    /// Ids of the direct subtasks of `id`
    fn list_subtasks(&self, id: &str) -> impl Future<Output = DbResult<Vec<String>>> + Send;

    /// Tasks matching a filter, ordered by display ID
    fn list_candidate_tasks(
        &self,
        filter: &TaskFilter,
    ) -> impl Future<Output = DbResult<Vec<Task>>> + Send;
}

impl TaskStore for Database {
    async fn get_task(&self, id: &str) -> DbResult<Option<Task>> {
        self.tasks().get(id).await
    }

    async fn list_dependencies(&self, id: &str) -> DbResult<Vec<String>> {
        self.relationships().get_dependencies(id).await
    }

    async fn list_dependents(&self, id: &str) -> DbResult<Vec<String>> {
        self.relationships().get_dependents(id).await
    }

    async fn list_subtasks(&self, id: &str) -> DbResult<Vec<String>> {
        self.relationships().get_children(id).await
    }

    async fn list_candidate_tasks(&self, filter: &TaskFilter) -> DbResult<Vec<Task>> {
        self.lister().list(filter).await
    }
}

impl TaskStore for GraphSnapshot {
    async fn get_task(&self, id: &str) -> DbResult<Option<Task>> {
        Ok(self.task(id).cloned())
    }

    async fn list_dependencies(&self, id: &str) -> DbResult<Vec<String>> {
        Ok(self.dependencies(id).to_vec())
    }

    async fn list_dependents(&self, id: &str) -> DbResult<Vec<String>> {
        Ok(self.dependents(id).to_vec())
    }

    async fn list_subtasks(&self, id: &str) -> DbResult<Vec<String>> {
        Ok(self.subtasks(id).to_vec())
    }

    async fn list_candidate_tasks(&self, filter: &TaskFilter) -> DbResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .task_ids()
            .filter_map(|id| self.task(id))
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            display_id_order(&a.display_id).cmp(&display_id_order(&b.display_id))
        });
        Ok(tasks)
    }
}

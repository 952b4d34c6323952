//! Dependency graph engine
//!
//! Turns the task graph into dependency trees, readiness lists, critical
//! paths and cycle diagnostics. Each call loads a fresh [`GraphSnapshot`]
//! from a [`TaskStore`] and then runs a synchronous algorithm over it; the
//! engine never writes to the store.

mod critical_path;
mod cycle;
mod readiness;
mod snapshot;
mod store;
mod tree;

pub use critical_path::{CriticalPath, CriticalPathOptions};
pub use cycle::{CycleReport, find_any_cycle, find_circular_path, has_circular_dependency};
pub use readiness::{
    DEPENDENT_CAP, DEPENDENT_WEIGHT, PRIORITY_WEIGHT, QUICK_WIN_BONUS, ReadyQuery, ReadyTask,
    is_ready, open_dependents, priority_score, rank_ready,
};
pub use snapshot::{GraphSnapshot, load_all, load_neighbourhood, load_reachable};
pub use store::TaskStore;
pub use tree::{
    DEFAULT_MAX_NODES, Relation, TreeNode, TreeOptions, build_forest, build_tree, forest_roots,
};

use serde::Serialize;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::models::{Priority, Status, Task};

/// The task fields carried by every engine result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    /// Record key
    pub id: String,
    pub display_id: String,
    pub name: String,
    pub status: Status,
    pub priority: Priority,
    pub estimated_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl TaskSummary {
    pub fn from_task(id: &str, task: &Task) -> Self {
        Self {
            id: id.to_string(),
            display_id: task.display_id.clone(),
            name: task.name.clone(),
            status: task.status,
            priority: task.priority,
            estimated_hours: task.estimated_hours,
            category: task.category.clone(),
            assignee: task.assignee.clone(),
        }
    }

    /// Summaries for `ids`, skipping any not in the snapshot
    pub fn collect<S: AsRef<str>>(snapshot: &GraphSnapshot, ids: &[S]) -> Vec<Self> {
        ids.iter()
            .filter_map(|id| {
                let id = id.as_ref();
                snapshot.task(id).map(|task| Self::from_task(id, task))
            })
            .collect()
    }
}

/// Graph queries over a task store
///
/// Lookups that tolerate absence (`build_dependency_tree`) return
/// `Option`; the others fail with `DbError::NotFound` for an unknown root.
pub struct GraphEngine<'a, S: TaskStore> {
    store: &'a S,
}

impl<'a, S: TaskStore> GraphEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Tree rooted at `root`, `None` if the task does not exist.
    pub async fn build_dependency_tree(
        &self,
        root: &str,
        options: &TreeOptions,
    ) -> DbResult<Option<TreeNode>> {
        let snapshot =
            load_reachable(self.store, root, &options.relations(), options.max_depth).await?;
        Ok(build_tree(&snapshot, root, options))
    }

    /// One tree per open task with no parent and no dependencies.
    pub async fn build_forest(&self, options: &TreeOptions) -> DbResult<Vec<TreeNode>> {
        let snapshot = load_all(self.store).await?;
        let forest = build_forest(&snapshot, options);
        debug!("Built forest of {} trees", forest.len());
        Ok(forest)
    }

    /// Whether `task_id` is on a dependency cycle.
    pub async fn has_circular_dependency(&self, task_id: &str) -> DbResult<bool> {
        let snapshot = self.dependency_closure(task_id).await?;
        Ok(has_circular_dependency(&snapshot, task_id))
    }

    /// Shortest cycle through `task_id`, `None` if there is none.
    pub async fn find_circular_path(&self, task_id: &str) -> DbResult<Option<Vec<TaskSummary>>> {
        let snapshot = self.dependency_closure(task_id).await?;
        Ok(find_circular_path(&snapshot, task_id)
            .map(|ids| TaskSummary::collect(&snapshot, &ids)))
    }

    /// Cycle diagnostics for one task, or for the whole graph when no task
    /// is given.
    pub async fn cycle_report(&self, task_id: Option<&str>) -> DbResult<CycleReport> {
        match task_id {
            Some(task_id) => {
                let snapshot = self.dependency_closure(task_id).await?;
                let cycle = find_circular_path(&snapshot, task_id);
                Ok(CycleReport::from_cycle(&snapshot, cycle))
            }
            None => {
                let snapshot = load_all(self.store).await?;
                let cycle = find_any_cycle(&snapshot);
                Ok(CycleReport::from_cycle(&snapshot, cycle))
            }
        }
    }

    /// Heaviest dependency chain ending at `task_id`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` for an unknown task and
    /// `DbError::CyclicGraph` when a cycle is reachable from it.
    pub async fn calculate_critical_path(
        &self,
        task_id: &str,
        options: &CriticalPathOptions,
    ) -> DbResult<CriticalPath> {
        let snapshot = self.dependency_closure(task_id).await?;
        critical_path::calculate(&snapshot, task_id, options)
    }

    /// Ranked ready tasks matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidParameter` for a zero limit.
    pub async fn get_ready_tasks(&self, query: &ReadyQuery) -> DbResult<Vec<ReadyTask>> {
        query.validate()?;

        let candidates = self.store.list_candidate_tasks(&query.filter()).await?;
        let ids: Vec<String> = candidates.iter().filter_map(Task::key).collect();
        debug!("Scoring {} readiness candidates", ids.len());

        let snapshot = load_neighbourhood(self.store, candidates).await?;
        Ok(rank_ready(
            &snapshot,
            ids.iter().map(String::as_str),
            query.limit,
        ))
    }

    /// Dependency closure of an existing task.
    async fn dependency_closure(&self, task_id: &str) -> DbResult<GraphSnapshot> {
        let snapshot =
            load_reachable(self.store, task_id, &[Relation::Dependencies], None).await?;
        if !snapshot.contains(task_id) {
            return Err(DbError::NotFound {
                task_id: task_id.to_string(),
            });
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        cleanup, create_child_of, create_depends_on, create_task, setup_test_db,
    };

    #[tokio::test]
    async fn test_tree_from_database() {
        let (db, temp_dir) = setup_test_db("engine").await;

        create_task(&db, "epic", "T-0001", "Epic", "todo", None).await;
        create_task(&db, "api", "T-0002", "API", "todo", Some(3.0)).await;
        create_task(&db, "schema", "T-0003", "Schema", "completed", Some(1.0)).await;
        create_child_of(&db, "api", "epic").await;
        create_depends_on(&db, "api", "schema").await;

        let tree = db
            .graph()
            .build_dependency_tree("epic", &TreeOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tree.task.display_id, "T-0001");
        assert_eq!(tree.subtasks.len(), 1);
        let api = &tree.subtasks[0];
        assert_eq!(api.task.id, "api");
        assert_eq!(api.dependencies[0].task.status, Status::Completed);

        let missing = db
            .graph()
            .build_dependency_tree("nope", &TreeOptions::default())
            .await
            .unwrap();
        assert!(missing.is_none());

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_tree_depth_bound_from_database() {
        let (db, temp_dir) = setup_test_db("engine").await;

        create_task(&db, "a", "T-0001", "A", "todo", None).await;
        create_task(&db, "b", "T-0002", "B", "todo", None).await;
        create_task(&db, "c", "T-0003", "C", "todo", None).await;
        create_depends_on(&db, "a", "b").await;
        create_depends_on(&db, "b", "c").await;

        let graph = db.graph();
        let root_only = graph
            .build_dependency_tree("a", &TreeOptions::from_depth(0).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(root_only.size(), 1);

        let one = graph
            .build_dependency_tree("a", &TreeOptions::from_depth(1).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(one.size(), 2);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_cycle_round_trip_from_database() {
        let (db, temp_dir) = setup_test_db("engine").await;

        create_task(&db, "a", "T-0001", "A", "todo", None).await;
        create_task(&db, "b", "T-0002", "B", "todo", None).await;
        create_task(&db, "c", "T-0003", "C", "todo", None).await;
        create_depends_on(&db, "a", "b").await;
        create_depends_on(&db, "b", "c").await;
        create_depends_on(&db, "c", "a").await;

        let graph = db.graph();
        for id in ["a", "b", "c"] {
            assert!(graph.has_circular_dependency(id).await.unwrap());
            let path = graph.find_circular_path(id).await.unwrap().unwrap();
            assert_eq!(path.len(), 3);
            assert_eq!(path[0].id, id);
        }

        let report = graph.cycle_report(None).await.unwrap();
        assert!(report.has_cycle);

        // A tree over the cycle terminates with the repeat marked
        let tree = graph
            .build_dependency_tree("a", &TreeOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tree.size(), 4);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_cycle_queries_require_existing_task() {
        let (db, temp_dir) = setup_test_db("engine").await;

        let result = db.graph().has_circular_dependency("ghost").await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
        let result = db.graph().cycle_report(Some("ghost")).await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));

        let report = db.graph().cycle_report(None).await.unwrap();
        assert!(!report.has_cycle);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_critical_path_from_database() {
        let (db, temp_dir) = setup_test_db("engine").await;

        create_task(&db, "a", "T-0001", "A", "todo", Some(2.0)).await;
        create_task(&db, "b", "T-0002", "B", "todo", Some(3.0)).await;
        create_task(&db, "c", "T-0003", "C", "todo", Some(1.0)).await;
        create_depends_on(&db, "a", "b").await;
        create_depends_on(&db, "b", "c").await;

        let graph = db.graph();
        let path = graph
            .calculate_critical_path("a", &CriticalPathOptions::default())
            .await
            .unwrap();
        let ids: Vec<&str> = path.path.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(path.total_hours, 6.0);

        create_depends_on(&db, "c", "a").await;
        let result = graph
            .calculate_critical_path("a", &CriticalPathOptions::default())
            .await;
        assert!(matches!(result, Err(DbError::CyclicGraph { .. })));

        let result = graph
            .calculate_critical_path("ghost", &CriticalPathOptions::default())
            .await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_ready_tasks_follow_dependency_status() {
        let (db, temp_dir) = setup_test_db("engine").await;

        create_task(&db, "x", "T-0001", "X", "todo", None).await;
        create_task(&db, "y", "T-0002", "Y", "todo", None).await;
        create_depends_on(&db, "x", "y").await;

        let graph = db.graph();
        let ready = graph.get_ready_tasks(&ReadyQuery::new()).await.unwrap();
        let ids: Vec<&str> = ready.iter().map(|r| r.task.id.as_str()).collect();
        assert_eq!(ids, vec!["y"]);
        assert_eq!(ready[0].dependents_count, 1);

        db.tasks().update_status("y", Status::Completed).await.unwrap();
        let ready = graph.get_ready_tasks(&ReadyQuery::new()).await.unwrap();
        let ids: Vec<&str> = ready.iter().map(|r| r.task.id.as_str()).collect();
        assert_eq!(ids, vec!["x"]);

        // Unchanged data gives the same answer
        let again = graph.get_ready_tasks(&ReadyQuery::new()).await.unwrap();
        assert_eq!(ready, again);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_ready_tasks_filters_and_limit() {
        let (db, temp_dir) = setup_test_db("engine").await;
        let repo = db.tasks();

        repo.create(
            "one",
            &Task::new("T-0001", "One")
                .with_category("backend")
                .with_priority(Priority::Low),
        )
        .await
        .unwrap();
        repo.create(
            "two",
            &Task::new("T-0002", "Two")
                .with_category("backend")
                .with_priority(Priority::High),
        )
        .await
        .unwrap();
        repo.create("three", &Task::new("T-0003", "Three").with_category("docs"))
            .await
            .unwrap();

        let graph = db.graph();
        let query = ReadyQuery::new().with_category("backend");
        let ready = graph.get_ready_tasks(&query).await.unwrap();
        let ids: Vec<&str> = ready.iter().map(|r| r.task.id.as_str()).collect();
        assert_eq!(ids, vec!["two", "one"]);

        let limited = graph
            .get_ready_tasks(&query.clone().with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        let result = graph.get_ready_tasks(&ReadyQuery::new().with_limit(0)).await;
        assert!(matches!(result, Err(DbError::InvalidParameter { .. })));

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_forest_from_database() {
        let (db, temp_dir) = setup_test_db("engine").await;

        create_task(&db, "epic", "T-0001", "Epic", "todo", None).await;
        create_task(&db, "child", "T-0002", "Child", "todo", None).await;
        create_task(&db, "blocked", "T-0003", "Blocked", "todo", None).await;
        create_task(&db, "done", "T-0004", "Done", "completed", None).await;
        create_child_of(&db, "child", "epic").await;
        create_depends_on(&db, "blocked", "epic").await;

        let forest = db.graph().build_forest(&TreeOptions::forest()).await.unwrap();
        let roots: Vec<&str> = forest.iter().map(|n| n.task.id.as_str()).collect();
        assert_eq!(roots, vec!["epic"]);
        assert_eq!(forest[0].subtasks[0].task.id, "child");
        assert_eq!(forest[0].dependents[0].task.id, "blocked");

        cleanup(&temp_dir);
    }

    #[test]
    fn test_summary_collect_skips_unknown() {
        let mut snapshot = GraphSnapshot::new();
        snapshot.insert_task("a", Task::new("T-0001", "A"));
        let summaries = TaskSummary::collect(&snapshot, &["a", "ghost"]);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].display_id, "T-0001");
    }
}

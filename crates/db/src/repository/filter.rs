//! Task filtering and listing queries
//!
//! Provides a builder-pattern TaskFilter and TaskLister for querying
//! tasks with filter combinations. The graph engine uses the same filter
//! to ask the store for readiness candidates.

use crate::error::DbResult;
use crate::models::{Status, Task};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::debug;

/// Filter criteria for listing tasks
///
/// All filter criteria use OR semantics within the same type
/// (e.g., multiple statuses means "match any of these statuses")
/// and AND semantics across different types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    /// Filter by statuses (OR semantics)
    pub statuses: Vec<Status>,
    /// Exact category match
    pub category: Option<String>,
    /// Exact assignee match
    pub assignee: Option<String>,
    /// Include completed and archived items (excluded by default)
    pub include_terminal: bool,
}

impl TaskFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter that matches every task, terminal ones included
    pub fn all() -> Self {
        Self::default().include_terminal()
    }

    /// Add a status to filter by
    pub fn with_status(mut self, status: Status) -> Self {
        self.statuses.push(status);
        self
    }

    /// Restrict to one category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restrict to one assignee
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Include completed and archived items
    pub fn include_terminal(mut self) -> Self {
        self.include_terminal = true;
        self
    }

    /// Check whether a task satisfies this filter.
    ///
    /// Mirrors the WHERE clause built by [`TaskLister`] so that in-memory
    /// stores and post-filters agree with the database.
    pub fn matches(&self, task: &Task) -> bool {
        if !self.include_terminal && self.statuses.is_empty() && task.status.is_terminal() {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if let Some(category) = &self.category
            && task.category.as_ref() != Some(category)
        {
            return false;
        }
        if let Some(assignee) = &self.assignee
            && task.assignee.as_ref() != Some(assignee)
        {
            return false;
        }
        true
    }
}

/// Repository for listing tasks with filters
pub struct TaskLister<'a> {
    client: &'a Surreal<Db>,
}

impl<'a> TaskLister<'a> {
    /// Create a new TaskLister with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// List tasks matching the given filter, ordered by display ID.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` if the database query fails.
    pub async fn list(&self, filter: &TaskFilter) -> DbResult<Vec<Task>> {
        let conditions = self.build_filter_conditions(filter);

        let query = if conditions.is_empty() {
            "SELECT * FROM task ORDER BY display_id NUMERIC".to_string()
        } else {
            format!(
                "SELECT * FROM task WHERE {} ORDER BY display_id NUMERIC",
                conditions.join(" AND ")
            )
        };
        debug!("Listing tasks: {}", query);

        let mut request = self.client.query(&query);
        if let Some(category) = &filter.category {
            request = request.bind(("category", category.clone()));
        }
        if let Some(assignee) = &filter.assignee {
            request = request.bind(("assignee", assignee.clone()));
        }

        let mut result = request.await?;
        let tasks: Vec<Task> = result.take(0)?;
        Ok(tasks)
    }

    /// Build filter condition strings for the WHERE clause
    fn build_filter_conditions(&self, filter: &TaskFilter) -> Vec<String> {
        let mut conditions: Vec<String> = Vec::new();

        // Default: exclude terminal statuses unless requested or statuses are explicit
        if !filter.include_terminal && filter.statuses.is_empty() {
            conditions.push("status NOT IN [\"completed\", \"archived\"]".to_string());
        }

        if !filter.statuses.is_empty() {
            let status_conditions: Vec<String> = filter
                .statuses
                .iter()
                .map(|s| format!("status = \"{}\"", s.as_str()))
                .collect();
            conditions.push(format!("({})", status_conditions.join(" OR ")));
        }

        if filter.category.is_some() {
            conditions.push("category = $category".to_string());
        }

        if filter.assignee.is_some() {
            conditions.push("assignee = $assignee".to_string());
        }

        conditions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{cleanup, setup_test_db};

    async fn create(db: &crate::Database, id: &str, task: Task) {
        db.tasks().create(id, &task).await.unwrap();
    }

    fn ids(tasks: &[Task]) -> Vec<String> {
        tasks.iter().filter_map(|t| t.key()).collect()
    }

    #[test]
    fn test_filter_builder() {
        let filter = TaskFilter::new()
            .with_status(Status::Todo)
            .with_category("backend")
            .with_assignee("sam");

        assert_eq!(filter.statuses, vec![Status::Todo]);
        assert_eq!(filter.category.as_deref(), Some("backend"));
        assert_eq!(filter.assignee.as_deref(), Some("sam"));
        assert!(!filter.include_terminal);
    }

    #[test]
    fn test_matches_excludes_terminal_by_default() {
        let done = Task::new("T-0001", "Done").with_status(Status::Completed);
        let archived = Task::new("T-0002", "Gone").with_status(Status::Archived);
        let open = Task::new("T-0003", "Open");

        let filter = TaskFilter::new();
        assert!(!filter.matches(&done));
        assert!(!filter.matches(&archived));
        assert!(filter.matches(&open));

        assert!(TaskFilter::all().matches(&done));
        assert!(
            TaskFilter::new()
                .with_status(Status::Completed)
                .matches(&done)
        );
    }

    #[test]
    fn test_matches_category_and_assignee() {
        let task = Task::new("T-0001", "Task")
            .with_category("backend")
            .with_assignee("sam");

        assert!(TaskFilter::new().with_category("backend").matches(&task));
        assert!(!TaskFilter::new().with_category("frontend").matches(&task));
        assert!(TaskFilter::new().with_assignee("sam").matches(&task));
        assert!(!TaskFilter::new().with_assignee("kim").matches(&task));
        assert!(
            !TaskFilter::new()
                .with_category("backend")
                .matches(&Task::new("T-0002", "Uncategorised"))
        );
    }

    #[tokio::test]
    async fn test_list_excludes_terminal_by_default() {
        let (db, temp_dir) = setup_test_db("filter").await;

        create(&db, "open", Task::new("T-0001", "Open")).await;
        create(
            &db,
            "done",
            Task::new("T-0002", "Done").with_status(Status::Completed),
        )
        .await;
        create(
            &db,
            "gone",
            Task::new("T-0003", "Gone").with_status(Status::Archived),
        )
        .await;

        let tasks = db.lister().list(&TaskFilter::new()).await.unwrap();
        assert_eq!(ids(&tasks), vec!["open"]);

        let all = db.lister().list(&TaskFilter::all()).await.unwrap();
        assert_eq!(ids(&all), vec!["open", "done", "gone"]);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_list_by_status_category_assignee() {
        let (db, temp_dir) = setup_test_db("filter").await;

        create(
            &db,
            "back1",
            Task::new("T-0001", "Backend 1")
                .with_category("backend")
                .with_assignee("sam"),
        )
        .await;
        create(
            &db,
            "back2",
            Task::new("T-0002", "Backend 2")
                .with_category("backend")
                .with_status(Status::InProgress),
        )
        .await;
        create(
            &db,
            "front1",
            Task::new("T-0003", "Frontend 1").with_category("frontend"),
        )
        .await;

        let filter = TaskFilter::new()
            .with_status(Status::Todo)
            .with_category("backend");
        let tasks = db.lister().list(&filter).await.unwrap();
        assert_eq!(ids(&tasks), vec!["back1"]);

        let filter = TaskFilter::new().with_assignee("sam");
        let tasks = db.lister().list(&filter).await.unwrap();
        assert_eq!(ids(&tasks), vec!["back1"]);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_list_orders_by_display_sequence() {
        let (db, temp_dir) = setup_test_db("filter").await;

        create(&db, "late", Task::new("T-10000", "Late")).await;
        create(&db, "early", Task::new("T-9999", "Early")).await;
        create(&db, "first", Task::new("T-0001", "First")).await;

        let tasks = db.lister().list(&TaskFilter::new()).await.unwrap();
        assert_eq!(ids(&tasks), vec!["first", "early", "late"]);

        cleanup(&temp_dir);
    }
}

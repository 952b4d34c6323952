//! Task repository for CRUD operations on tasks
//!
//! Provides a repository pattern implementation for task operations,
//! encapsulating SurrealDB queries and providing a clean API.

use crate::error::{DbError, DbResult};
use crate::models::{DISPLAY_ID_PREFIX, Status, Task};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace};

/// Repository for task CRUD operations
///
/// Encapsulates database queries for tasks, providing a clean API
/// that hides the underlying SurrealDB implementation details.
pub struct TaskRepository<'a> {
    client: &'a Surreal<Db>,
}

/// Minimal row for checking task existence
#[derive(Debug, Deserialize)]
struct IdOnly {
    #[allow(dead_code)]
    id: surrealdb::sql::Thing,
}

/// Row for counting tasks
#[derive(Debug, Deserialize)]
struct CountRow {
    total: usize,
}

/// Format a sequence number as a display ID
fn format_display_id(sequence: usize) -> String {
    format!("{}{:04}", DISPLAY_ID_PREFIX, sequence)
}

impl<'a> TaskRepository<'a> {
    /// Create a new TaskRepository with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// Check if a task with the given ID exists.
    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let task: Option<IdOnly> = self
            .client
            .select(("task", id))
            .await
            .map_err(|e| DbError::Query(Box::new(e)))?;
        Ok(task.is_some())
    }

    /// Create a new task with the specified ID.
    ///
    /// The task's `display_id` must already be assigned (see
    /// [`TaskRepository::next_display_id`]).
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` if the database operation fails, including
    /// when the display ID is already taken.
    pub async fn create(&self, id: &str, task: &Task) -> DbResult<()> {
        debug!("Creating task: {} with name: {}", id, task.name);
        trace!("Task data: {:?}", task);

        let hours_str = match task.estimated_hours {
            Some(h) => format!("{:?}", h),
            None => "NONE".to_string(),
        };

        let mut assignments = vec![
            "display_id = $display_id".to_string(),
            "name = $name".to_string(),
            format!("status = \"{}\"", task.status.as_str()),
            format!("priority = \"{}\"", task.priority.as_str()),
            format!("estimated_hours = {}", hours_str),
            "tags = $tags".to_string(),
        ];
        if task.category.is_some() {
            assignments.push("category = $category".to_string());
        }
        if task.assignee.is_some() {
            assignments.push("assignee = $assignee".to_string());
        }

        let query = format!("CREATE task:{} SET {}", id, assignments.join(", "));

        let mut request = self
            .client
            .query(&query)
            .bind(("display_id", task.display_id.clone()))
            .bind(("name", task.name.clone()))
            .bind(("tags", task.tags.clone()));
        if let Some(category) = &task.category {
            request = request.bind(("category", category.clone()));
        }
        if let Some(assignee) = &task.assignee {
            request = request.bind(("assignee", assignee.clone()));
        }

        let mut response = request.await?;
        response.take::<Vec<IdOnly>>(0)?;
        Ok(())
    }

    /// Get a task by ID.
    ///
    /// # Returns
    ///
    /// `Some(Task)` if found, `None` otherwise.
    pub async fn get(&self, id: &str) -> DbResult<Option<Task>> {
        debug!("Fetching task: {}", id);
        let task: Option<Task> = self.client.select(("task", id)).await.map_err(|e| {
            debug!("Failed to fetch task: {}: {}", id, e);
            DbError::Query(Box::new(e))
        })?;
        if task.is_none() {
            debug!("Task not found: {}", id);
        }
        Ok(task)
    }

    /// Get a task by its display ID (`T-0001`).
    pub async fn get_by_display_id(&self, display_id: &str) -> DbResult<Option<Task>> {
        let mut result = self
            .client
            .query("SELECT * FROM task WHERE display_id = $display_id LIMIT 1")
            .bind(("display_id", display_id.to_string()))
            .await?;
        let tasks: Vec<Task> = result.take(0)?;
        Ok(tasks.into_iter().next())
    }

    /// Resolve a user-supplied reference (record key or display ID) to a
    /// record key.
    pub async fn resolve(&self, reference: &str) -> DbResult<Option<String>> {
        if reference.starts_with(DISPLAY_ID_PREFIX)
            && let Some(task) = self.get_by_display_id(reference).await?
        {
            return Ok(task.key());
        }
        if self.exists(reference).await? {
            return Ok(Some(reference.to_string()));
        }
        Ok(None)
    }

    /// Compute the next free display ID.
    ///
    /// Starts from the current task count and skips forward over any code
    /// that is already taken.
    pub async fn next_display_id(&self) -> DbResult<String> {
        let mut result = self
            .client
            .query("SELECT count() AS total FROM task GROUP ALL")
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        let mut sequence = rows.first().map(|r| r.total).unwrap_or(0) + 1;

        loop {
            let candidate = format_display_id(sequence);
            if self.get_by_display_id(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            sequence += 1;
        }
    }

    /// Update the status of a task.
    ///
    /// Moving to `completed` stamps `completed_at`; any other status
    /// clears it.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task does not exist.
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn update_status(&self, id: &str, status: Status) -> DbResult<()> {
        if !self.exists(id).await? {
            return Err(DbError::NotFound {
                task_id: id.to_string(),
            });
        }

        let completed_at = if status == Status::Completed {
            "time::now()"
        } else {
            "NONE"
        };
        let query = format!(
            "UPDATE task:{} SET status = '{}', updated_at = time::now(), completed_at = {}",
            id,
            status.as_str(),
            completed_at
        );
        debug!("Setting status of {} to {}", id, status);
        self.client.query(&query).await?;
        Ok(())
    }
}

//! Relationship repository for managing task relationships
//!
//! Provides a repository pattern implementation for graph edge operations,
//! encapsulating SurrealDB RELATE queries for child_of and depends_on edges.

use crate::error::{DbError, DbResult};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::debug;

/// Repository for task relationship (edge) operations
///
/// Manages the two relationship types in Trellis:
/// - `child_of`: Subtask hierarchy (child -> parent)
/// - `depends_on`: Task dependencies (dependent -> dependency)
pub struct RelationshipRepository<'a> {
    client: &'a Surreal<Db>,
}

/// Minimal row for checking edge existence
#[derive(Debug, Deserialize)]
struct EdgeRow {
    #[allow(dead_code)]
    id: surrealdb::sql::Thing,
}

/// Row for fetching task IDs from task queries
#[derive(Debug, Deserialize)]
struct TaskIdRow {
    id: surrealdb::sql::Thing,
}

/// Row for fetching the far endpoint of an edge
#[derive(Debug, Deserialize)]
struct EndpointRow {
    endpoint: surrealdb::sql::Thing,
}

impl<'a> RelationshipRepository<'a> {
    /// Create a new RelationshipRepository with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    // ========================================
    // child_of relationship methods
    // ========================================

    /// Make `parent_id` the parent of `child_id`.
    ///
    /// A task has at most one parent, so any existing child_of edge from
    /// the child is replaced.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` if the task would be its own parent.
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn create_child_of(&self, child_id: &str, parent_id: &str) -> DbResult<()> {
        if child_id == parent_id {
            return Err(DbError::ValidationError {
                message: format!("Task '{}' cannot be its own parent", child_id),
            });
        }

        self.remove_child_of(child_id).await?;
        let query = format!("RELATE task:{} -> child_of -> task:{}", child_id, parent_id);
        self.client.query(&query).await?.check()?;
        Ok(())
    }

    /// Remove the child_of relationship for a task.
    pub async fn remove_child_of(&self, child_id: &str) -> DbResult<()> {
        let query = format!("DELETE child_of WHERE in = task:{}", child_id);
        self.client.query(&query).await?;
        Ok(())
    }

    /// Get all direct children (subtasks) of a task, in display ID order.
    pub async fn get_children(&self, parent_id: &str) -> DbResult<Vec<String>> {
        let query = format!(
            "SELECT id, display_id FROM task WHERE ->child_of->task CONTAINS task:{} ORDER BY display_id NUMERIC",
            parent_id
        );
        let mut result = self.client.query(&query).await?;
        let rows: Vec<TaskIdRow> = result.take(0)?;

        Ok(rows.into_iter().map(|r| r.id.id.to_string()).collect())
    }

    // ========================================
    // depends_on relationship methods
    // ========================================

    /// Record that `task_id` depends on `depends_on_id`.
    ///
    /// Idempotent: creating an edge that already exists is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if a new edge was created, `false` if it already existed.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` for a self-dependency.
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn create_depends_on(&self, task_id: &str, depends_on_id: &str) -> DbResult<bool> {
        if task_id == depends_on_id {
            return Err(DbError::ValidationError {
                message: format!("Task '{}' cannot depend on itself", task_id),
            });
        }

        if self.depends_on_exists(task_id, depends_on_id).await? {
            debug!(
                "Dependency {} -> {} already exists",
                task_id, depends_on_id
            );
            return Ok(false);
        }

        let query = format!(
            "RELATE task:{} -> depends_on -> task:{}",
            task_id, depends_on_id
        );
        self.client.query(&query).await?.check()?;
        Ok(true)
    }

    /// Remove a specific depends_on relationship between two tasks.
    ///
    /// # Returns
    ///
    /// `true` if an edge was removed, `false` if none existed.
    pub async fn remove_depends_on(&self, task_id: &str, depends_on_id: &str) -> DbResult<bool> {
        if !self.depends_on_exists(task_id, depends_on_id).await? {
            return Ok(false);
        }
        let query = format!(
            "DELETE depends_on WHERE in = task:{} AND out = task:{}",
            task_id, depends_on_id
        );
        self.client.query(&query).await?;
        Ok(true)
    }

    /// Check if a depends_on relationship exists between two tasks.
    pub async fn depends_on_exists(&self, task_id: &str, depends_on_id: &str) -> DbResult<bool> {
        let query = format!(
            "SELECT id FROM depends_on WHERE in = task:{} AND out = task:{}",
            task_id, depends_on_id
        );
        let mut result = self.client.query(&query).await?;
        let edges: Vec<EdgeRow> = result.take(0)?;
        Ok(!edges.is_empty())
    }

    /// Get all tasks that a task depends on, in edge creation order.
    pub async fn get_dependencies(&self, task_id: &str) -> DbResult<Vec<String>> {
        let query = format!(
            "SELECT out AS endpoint, created_at FROM depends_on WHERE in = task:{} ORDER BY created_at",
            task_id
        );
        let mut result = self.client.query(&query).await?;
        let rows: Vec<EndpointRow> = result.take(0)?;

        Ok(rows.into_iter().map(|r| r.endpoint.id.to_string()).collect())
    }

    /// Get all tasks that depend on a task (its dependents).
    pub async fn get_dependents(&self, task_id: &str) -> DbResult<Vec<String>> {
        let query = format!(
            "SELECT in AS endpoint, created_at FROM depends_on WHERE out = task:{} ORDER BY created_at",
            task_id
        );
        let mut result = self.client.query(&query).await?;
        let rows: Vec<EndpointRow> = result.take(0)?;

        Ok(rows.into_iter().map(|r| r.endpoint.id.to_string()).collect())
    }
}

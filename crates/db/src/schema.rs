//! Database schema initialization for Trellis
//!
//! Defines the SurrealDB schema for tasks and the two graph edge
//! tables (subtask hierarchy and dependencies).

use crate::error::DbError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// SQL statements for schema initialization
mod sql {
    /// Define the task table with all fields
    pub const DEFINE_TASK_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS task SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS display_id ON task TYPE string;

        DEFINE FIELD IF NOT EXISTS name ON task TYPE string;

        DEFINE FIELD IF NOT EXISTS status ON task TYPE string
            ASSERT $value IN ["todo", "in_progress", "paused", "blocked", "completed", "archived"];

        DEFINE FIELD IF NOT EXISTS priority ON task TYPE string DEFAULT "medium"
            ASSERT $value IN ["low", "medium", "high"];

        DEFINE FIELD IF NOT EXISTS estimated_hours ON task TYPE option<float>
            ASSERT $value = NONE OR $value >= 0;

        DEFINE FIELD IF NOT EXISTS category ON task TYPE option<string>;

        DEFINE FIELD IF NOT EXISTS assignee ON task TYPE option<string>;

        DEFINE FIELD IF NOT EXISTS tags ON task TYPE array<string> DEFAULT [];

        DEFINE FIELD IF NOT EXISTS created_at ON task TYPE datetime DEFAULT time::now();

        DEFINE FIELD IF NOT EXISTS updated_at ON task TYPE datetime DEFAULT time::now();

        DEFINE FIELD IF NOT EXISTS completed_at ON task TYPE option<datetime>;

        DEFINE INDEX IF NOT EXISTS task_display_id ON task FIELDS display_id UNIQUE;
    "#;

    /// Define the child_of relation table for subtask edges (child -> parent)
    pub const DEFINE_CHILD_OF_RELATION: &str = r#"
        DEFINE TABLE IF NOT EXISTS child_of TYPE RELATION IN task OUT task;

        DEFINE FIELD IF NOT EXISTS created_at ON child_of TYPE datetime DEFAULT time::now();

        DEFINE INDEX IF NOT EXISTS child_of_single_parent ON child_of FIELDS in UNIQUE;
    "#;

    /// Define the depends_on relation table for dependency edges
    pub const DEFINE_DEPENDS_ON_RELATION: &str = r#"
        DEFINE TABLE IF NOT EXISTS depends_on TYPE RELATION IN task OUT task;

        DEFINE FIELD IF NOT EXISTS created_at ON depends_on TYPE datetime DEFAULT time::now();

        DEFINE INDEX IF NOT EXISTS depends_on_pair ON depends_on FIELDS in, out UNIQUE;
    "#;
}

/// Initialize the database schema.
///
/// Creates the task table, child_of relation, and depends_on relation
/// with all required fields, constraints and uniqueness indexes.
///
/// This function is idempotent - it can be called multiple times safely
/// as it uses `IF NOT EXISTS` clauses.
///
/// # Errors
///
/// Returns `DbError::Schema` if any schema definition fails.
pub async fn init_schema(client: &Surreal<Db>) -> Result<(), DbError> {
    client
        .query(sql::DEFINE_TASK_TABLE)
        .await
        .map_err(|e| DbError::Schema(Box::new(e)))?;

    client
        .query(sql::DEFINE_CHILD_OF_RELATION)
        .await
        .map_err(|e| DbError::Schema(Box::new(e)))?;

    client
        .query(sql::DEFINE_DEPENDS_ON_RELATION)
        .await
        .map_err(|e| DbError::Schema(Box::new(e)))?;

    Ok(())
}

//! Depend command for adding task dependencies
//!
//! Implements the `trl depend` command. Cycles are allowed in the graph;
//! when the new edge closes one, the command says so instead of refusing.

use crate::commands::{display_id, resolve_task};
use clap::Args;
use trellis_db::{Database, DbError};

/// Make a task depend on another task
#[derive(Debug, Args)]
pub struct DependCommand {
    /// Task that depends on the blocker (case-insensitive)
    #[arg(required = true)]
    pub id: String,

    /// Task that must be completed first (case-insensitive)
    #[arg(long = "on", required = true)]
    pub blocker_id: String,
}

/// Result of the depend command execution
#[derive(Debug)]
pub struct DependResult {
    pub task_id: String,
    pub blocker_id: String,
    /// False when the edge was already present
    pub created: bool,
    /// Display IDs of a cycle the task now sits on
    pub cycle: Option<Vec<String>>,
}

impl std::fmt::Display for DependResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.created {
            write!(
                f,
                "Added dependency: {} now depends on {}",
                self.task_id, self.blocker_id
            )?;
        } else {
            write!(
                f,
                "Dependency already exists: {} depends on {}",
                self.task_id, self.blocker_id
            )?;
        }
        if let Some(cycle) = &self.cycle
            && let Some(first) = cycle.first()
        {
            write!(
                f,
                "\nWarning: dependency cycle: {} -> {}",
                cycle.join(" -> "),
                first
            )?;
        }
        Ok(())
    }
}

impl DependCommand {
    /// Execute the depend command.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if either task does not exist.
    pub async fn execute(&self, db: &Database) -> Result<DependResult, DbError> {
        let task_id = resolve_task(db, &self.id).await?;
        let blocker_id = resolve_task(db, &self.blocker_id).await?;

        let created = db
            .relationships()
            .create_depends_on(&task_id, &blocker_id)
            .await?;

        let cycle = db
            .graph()
            .find_circular_path(&task_id)
            .await?
            .map(|path| path.into_iter().map(|t| t.display_id).collect());

        Ok(DependResult {
            task_id: display_id(db, &task_id).await?,
            blocker_id: display_id(db, &blocker_id).await?,
            created,
            cycle,
        })
    }
}

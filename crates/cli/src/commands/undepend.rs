//! Undepend command for removing task dependencies
//!
//! Implements the `trl undepend` command to remove dependency relationships between tasks.

use crate::commands::{display_id, resolve_task};
use clap::Args;
use trellis_db::{Database, DbError};

/// Remove a dependency relationship between tasks
#[derive(Debug, Args)]
pub struct UndependCommand {
    /// Task that depends on another task (case-insensitive)
    #[arg(required = true)]
    pub id: String,

    /// Blocker to remove (case-insensitive)
    #[arg(long = "on", required = true)]
    pub blocker_id: String,
}

/// Result of the undepend command execution
#[derive(Debug)]
pub struct UndependResult {
    /// The task that no longer depends on the blocker
    pub task_id: String,
    /// The blocker that was removed
    pub blocker_id: String,
    /// Whether the dependency existed before removal
    pub existed: bool,
}

impl std::fmt::Display for UndependResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.existed {
            write!(
                f,
                "Removed dependency: {} no longer depends on {}",
                self.task_id, self.blocker_id
            )
        } else {
            write!(
                f,
                "Warning: No dependency from {} to {} exists",
                self.task_id, self.blocker_id
            )
        }
    }
}

impl UndependCommand {
    /// Execute the undepend command.
    ///
    /// A missing edge is reported as a warning, not an error.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if either task does not exist.
    pub async fn execute(&self, db: &Database) -> Result<UndependResult, DbError> {
        let task_id = resolve_task(db, &self.id).await?;
        let blocker_id = resolve_task(db, &self.blocker_id).await?;

        let existed = db
            .relationships()
            .remove_depends_on(&task_id, &blocker_id)
            .await?;

        Ok(UndependResult {
            task_id: display_id(db, &task_id).await?,
            blocker_id: display_id(db, &blocker_id).await?,
            existed,
        })
    }
}

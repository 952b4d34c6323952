//! Critical path command
//!
//! Implements the `trl critical-path` command: the heaviest chain of
//! estimated work that must finish before a task can be done.

use crate::commands::resolve_task;
use crate::output::{format_critical_path, to_json};
use clap::Args;
use trellis_db::{CriticalPath, CriticalPathOptions, Database, DbError};

/// Show the longest chain of estimated work ending at a task
#[derive(Debug, Args)]
pub struct CriticalPathCommand {
    /// Target task (case-insensitive)
    #[arg(required = true)]
    pub id: String,

    /// Skip completed and archived dependencies
    #[arg(long)]
    pub remaining: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug)]
pub struct CriticalPathResult {
    pub path: CriticalPath,
    pub json: bool,
}

impl std::fmt::Display for CriticalPathResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.json {
            write!(f, "{}", to_json(&self.path))
        } else {
            write!(f, "{}", format_critical_path(&self.path))
        }
    }
}

impl CriticalPathCommand {
    /// Execute the critical-path command.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` for an unknown task and
    /// `DbError::CyclicGraph` when its dependencies contain a cycle.
    pub async fn execute(&self, db: &Database) -> Result<CriticalPathResult, DbError> {
        let task_id = resolve_task(db, &self.id).await?;
        let options = CriticalPathOptions {
            remaining_only: self.remaining,
        };
        let path = db
            .graph()
            .calculate_critical_path(&task_id, &options)
            .await?;

        Ok(CriticalPathResult {
            path,
            json: self.json,
        })
    }
}

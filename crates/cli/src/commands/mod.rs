//! CLI command definitions and dispatch for Trellis

mod add;
mod critical_path;
mod cycles;
mod depend;
mod ready;
mod status;
mod tree;
mod undepend;

pub use add::{AddCommand, AddResult};
pub use critical_path::{CriticalPathCommand, CriticalPathResult};
pub use cycles::{CyclesCommand, CyclesResult};
pub use depend::{DependCommand, DependResult};
pub use ready::{ReadyCommand, ReadyResult};
pub use status::{StatusCommand, StatusResult};
pub use tree::{TreeCommand, TreeResult};
pub use undepend::{UndependCommand, UndependResult};

use clap::Subcommand;
use trellis_db::{Database, DbError};

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new task
    Add(AddCommand),
    /// Make a task depend on another task
    Depend(DependCommand),
    /// Remove a dependency between two tasks
    Undepend(UndependCommand),
    /// Change the status of a task
    Status(StatusCommand),
    /// Show the dependency tree of a task, or every open root
    Tree(TreeCommand),
    /// Report dependency cycles
    Cycles(CyclesCommand),
    /// Show the longest chain of estimated work ending at a task
    CriticalPath(CriticalPathCommand),
    /// List tasks that can be started now, best first
    Ready(ReadyCommand),
}

impl Command {
    /// Execute the command and return its rendered output.
    pub async fn execute(&self, db: &Database) -> Result<String, DbError> {
        let output = match self {
            Command::Add(cmd) => cmd.execute(db).await?.to_string(),
            Command::Depend(cmd) => cmd.execute(db).await?.to_string(),
            Command::Undepend(cmd) => cmd.execute(db).await?.to_string(),
            Command::Status(cmd) => cmd.execute(db).await?.to_string(),
            Command::Tree(cmd) => cmd.execute(db).await?.to_string(),
            Command::Cycles(cmd) => cmd.execute(db).await?.to_string(),
            Command::CriticalPath(cmd) => cmd.execute(db).await?.to_string(),
            Command::Ready(cmd) => cmd.execute(db).await?.to_string(),
        };
        Ok(output)
    }
}

/// Normalize a user-supplied task reference.
///
/// Display IDs are matched in upper case (`t-0001` becomes `T-0001`);
/// record keys are lower case.
pub(crate) fn normalize_reference(reference: &str) -> String {
    let trimmed = reference.trim();
    let upper = trimmed.to_uppercase();
    if upper.starts_with("T-") {
        upper
    } else {
        trimmed.to_lowercase()
    }
}

/// Resolve a task reference to its record key.
///
/// # Errors
///
/// Returns `DbError::NotFound` if no task matches.
pub(crate) async fn resolve_task(db: &Database, reference: &str) -> Result<String, DbError> {
    let reference = normalize_reference(reference);
    db.tasks()
        .resolve(&reference)
        .await?
        .ok_or(DbError::NotFound { task_id: reference })
}

/// Display ID for a record key, falling back to the key itself.
pub(crate) async fn display_id(db: &Database, id: &str) -> Result<String, DbError> {
    Ok(db
        .tasks()
        .get(id)
        .await?
        .map(|task| task.display_id)
        .unwrap_or_else(|| id.to_string()))
}

//! Status command for moving a task through its lifecycle

use crate::commands::{display_id, resolve_task};
use clap::Args;
use trellis_db::{Database, DbError, Status};

/// Change the status of a task
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Task to update (case-insensitive)
    #[arg(required = true)]
    pub id: String,

    /// New status (todo, in_progress, paused, blocked, completed, archived)
    #[arg(required = true, value_parser = parse_status)]
    pub status: Status,
}

fn parse_status(s: &str) -> Result<Status, String> {
    Status::parse(&s.to_lowercase().replace('-', "_")).ok_or_else(|| {
        let valid: Vec<&str> = Status::ALL.iter().map(Status::as_str).collect();
        format!("invalid status '{}'. Valid values: {}", s, valid.join(", "))
    })
}

#[derive(Debug)]
pub struct StatusResult {
    pub task_id: String,
    pub status: Status,
}

impl std::fmt::Display for StatusResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is now {}", self.task_id, self.status)
    }
}

impl StatusCommand {
    pub async fn execute(&self, db: &Database) -> Result<StatusResult, DbError> {
        let task_id = resolve_task(db, &self.id).await?;
        db.tasks().update_status(&task_id, self.status).await?;

        Ok(StatusResult {
            task_id: display_id(db, &task_id).await?,
            status: self.status,
        })
    }
}

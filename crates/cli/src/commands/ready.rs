//! Ready command for listing startable work
//!
//! Implements the `trl ready` command: `todo` tasks whose dependencies are
//! all completed, ranked by priority, then by how much they unblock, then
//! by how quick they are.

use crate::output::{format_ready_table, to_json};
use clap::Args;
use trellis_db::{Database, DbError, ReadyQuery, ReadyTask};

/// List tasks that can be started now, best first
#[derive(Debug, Args)]
pub struct ReadyCommand {
    /// Only tasks in this category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only tasks with this assignee
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Show at most this many tasks
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Result of the ready command execution
#[derive(Debug)]
pub struct ReadyResult {
    /// Ready tasks, highest score first
    pub tasks: Vec<ReadyTask>,
    pub json: bool,
}

impl std::fmt::Display for ReadyResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.json {
            write!(f, "{}", to_json(&self.tasks))
        } else {
            write!(f, "{}", format_ready_table(&self.tasks))
        }
    }
}

impl ReadyCommand {
    fn query(&self) -> ReadyQuery {
        let mut query = ReadyQuery::new();
        if let Some(category) = &self.category {
            query = query.with_category(category.clone());
        }
        if let Some(assignee) = &self.assignee {
            query = query.with_assignee(assignee.clone());
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        query
    }

    /// Execute the ready command.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidParameter` for `--limit 0`, or `DbError`
    /// if database operations fail.
    pub async fn execute(&self, db: &Database) -> Result<ReadyResult, DbError> {
        let tasks = db.graph().get_ready_tasks(&self.query()).await?;
        Ok(ReadyResult {
            tasks,
            json: self.json,
        })
    }
}

//! Cycles command for dependency cycle diagnostics

use crate::commands::resolve_task;
use crate::output::{format_cycle_report, to_json};
use clap::Args;
use trellis_db::{CycleReport, Database, DbError};

/// Report dependency cycles
#[derive(Debug, Args)]
pub struct CyclesCommand {
    /// Only report a cycle through this task (case-insensitive)
    pub id: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug)]
pub struct CyclesResult {
    pub report: CycleReport,
    pub json: bool,
}

impl std::fmt::Display for CyclesResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.json {
            write!(f, "{}", to_json(&self.report))
        } else {
            write!(f, "{}", format_cycle_report(&self.report))
        }
    }
}

impl CyclesCommand {
    /// Execute the cycles command.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the given task does not exist.
    pub async fn execute(&self, db: &Database) -> Result<CyclesResult, DbError> {
        let task_id = match &self.id {
            Some(reference) => Some(resolve_task(db, reference).await?),
            None => None,
        };
        let report = db.graph().cycle_report(task_id.as_deref()).await?;

        Ok(CyclesResult {
            report,
            json: self.json,
        })
    }
}

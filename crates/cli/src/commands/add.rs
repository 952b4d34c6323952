//! Add command for creating new tasks
//!
//! Implements the `trl add` command. New tasks start as `todo` and receive
//! the next free display ID.

use crate::commands::resolve_task;
use crate::id::IdGenerator;
use clap::Args;
use tracing::debug;
use trellis_db::{Database, DbError, Priority, Task};

/// Create a new task
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Name of the task
    #[arg(required = true)]
    pub name: String,

    /// Priority (low, medium, high)
    #[arg(short, long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// Estimated effort in hours
    #[arg(short, long)]
    pub estimate: Option<f64>,

    /// Category used by `ready --category`
    #[arg(short, long)]
    pub category: Option<String>,

    /// Assignee used by `ready --assignee`
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Tags (can be specified multiple times)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Parent task (creates a subtask relationship)
    #[arg(long)]
    pub parent: Option<String>,

    /// Task this one depends on (can be specified multiple times)
    #[arg(long = "depends-on")]
    pub depends_on: Vec<String>,
}

/// Parse a priority string into a Priority enum
fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse(&s.to_lowercase())
        .ok_or_else(|| format!("invalid priority '{}'. Valid values: low, medium, high", s))
}

/// Result of the add command execution
#[derive(Debug)]
pub struct AddResult {
    /// Record key of the new task
    pub id: String,
    /// Display ID of the new task
    pub display_id: String,
}

impl std::fmt::Display for AddResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Created task {} ({})", self.display_id, self.id)
    }
}

impl AddCommand {
    /// Execute the add command.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if:
    /// - The name is empty or the estimate is negative
    /// - The parent or a dependency does not exist
    /// - Database operations fail
    pub async fn execute(&self, db: &Database) -> Result<AddResult, DbError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DbError::ValidationError {
                message: "task name must not be empty".to_string(),
            });
        }
        if let Some(hours) = self.estimate
            && (hours < 0.0 || !hours.is_finite())
        {
            return Err(DbError::ValidationError {
                message: format!("estimate must be a non-negative number of hours, got {}", hours),
            });
        }

        let parent = match &self.parent {
            Some(reference) => Some(resolve_task(db, reference).await?),
            None => None,
        };
        let mut dependencies = Vec::with_capacity(self.depends_on.len());
        for reference in &self.depends_on {
            dependencies.push(resolve_task(db, reference).await?);
        }

        let id = self.generate_unique_id(db, name).await?;
        let display_id = db.tasks().next_display_id().await?;

        let mut task = Task::new(display_id.clone(), name);
        if let Some(priority) = self.priority {
            task = task.with_priority(priority);
        }
        if let Some(hours) = self.estimate {
            task = task.with_estimate(hours);
        }
        if let Some(category) = &self.category {
            task = task.with_category(category.clone());
        }
        if let Some(assignee) = &self.assignee {
            task = task.with_assignee(assignee.clone());
        }
        if !self.tags.is_empty() {
            task = task.with_tags(self.tags.clone());
        }

        db.tasks().create(&id, &task).await?;
        debug!("Created task {} as {}", display_id, id);

        if let Some(parent_id) = &parent {
            db.relationships().create_child_of(&id, parent_id).await?;
        }
        for dependency in &dependencies {
            db.relationships().create_depends_on(&id, dependency).await?;
        }

        Ok(AddResult { id, display_id })
    }

    /// Generate a record key that no existing task uses.
    async fn generate_unique_id(&self, db: &Database, name: &str) -> Result<String, DbError> {
        let mut generator = IdGenerator::new(name);
        while let Some(candidate) = generator.next_id() {
            if !db.tasks().exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!("Record key {} already taken, retrying", candidate);
        }
        Err(DbError::ValidationError {
            message: "could not generate a unique task id".to_string(),
        })
    }
}

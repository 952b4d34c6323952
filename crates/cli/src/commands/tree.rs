//! Tree command for showing dependency trees
//!
//! Implements the `trl tree` command. With a task it prints the tree
//! rooted there; without one it prints the forest of open root tasks,
//! expanded along the tasks each root blocks and its subtasks.

use crate::commands::resolve_task;
use crate::output::{format_forest, format_tree, to_json};
use clap::Args;
use trellis_db::{DEFAULT_MAX_NODES, Database, DbError, Relation, TreeNode, TreeOptions};

/// Show the dependency tree of a task, or every open root
#[derive(Debug, Args)]
pub struct TreeCommand {
    /// Root task (case-insensitive); omit for the whole forest
    pub id: Option<String>,

    /// Maximum depth below the root
    #[arg(short, long, allow_negative_numbers = true)]
    pub depth: Option<i64>,

    /// Relations to expand: comma list of dependencies, dependents,
    /// subtasks, or `all` (default: dependencies,subtasks for a task,
    /// dependents,subtasks for the forest)
    #[arg(short, long)]
    pub relations: Option<String>,

    /// Stop expanding once a tree reaches this many nodes
    #[arg(long, default_value_t = DEFAULT_MAX_NODES)]
    pub max_nodes: usize,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Result of the tree command execution
#[derive(Debug)]
pub struct TreeResult {
    /// One entry for a rooted tree, one per root for a forest
    pub roots: Vec<TreeNode>,
    /// Whether a single root was requested
    pub rooted: bool,
    pub json: bool,
}

impl std::fmt::Display for TreeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.json, self.rooted, self.roots.first()) {
            (true, true, Some(root)) => write!(f, "{}", to_json(root)),
            (true, _, _) => write!(f, "{}", to_json(&self.roots)),
            (false, true, Some(root)) => write!(f, "{}", format_tree(root)),
            (false, _, _) => write!(f, "{}", format_forest(&self.roots)),
        }
    }
}

impl TreeCommand {
    fn options(&self) -> Result<TreeOptions, DbError> {
        let mut options = match self.id {
            Some(_) => TreeOptions::default(),
            None => TreeOptions::forest(),
        }
        .with_max_nodes(Some(self.max_nodes));
        if let Some(depth) = self.depth {
            options = options.with_depth(depth)?;
        }
        if let Some(relations) = &self.relations {
            options = options.with_relations(&Relation::parse_list(relations)?);
        }
        Ok(options)
    }

    /// Execute the tree command.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidParameter` for a negative depth or an
    /// unknown relation, and `DbError::NotFound` for an unknown root.
    pub async fn execute(&self, db: &Database) -> Result<TreeResult, DbError> {
        let options = self.options()?;

        let Some(reference) = &self.id else {
            let roots = db.graph().build_forest(&options).await?;
            return Ok(TreeResult {
                roots,
                rooted: false,
                json: self.json,
            });
        };

        let root_id = resolve_task(db, reference).await?;
        let root = db
            .graph()
            .build_dependency_tree(&root_id, &options)
            .await?
            .ok_or(DbError::NotFound { task_id: root_id })?;

        Ok(TreeResult {
            roots: vec![root],
            rooted: true,
            json: self.json,
        })
    }
}

//! Storage layer and dependency graph engine for Trellis
//!
//! Provides SurrealDB connection management with an embedded SurrealKV
//! backend, schema initialization, task/edge repositories, and the graph
//! engine that turns the task graph into trees, readiness lists,
//! critical paths and cycle diagnostics.

pub mod engine;
pub mod error;
pub mod models;
pub mod repository;
pub mod schema;

pub use engine::{
    CriticalPath, CriticalPathOptions, CycleReport, DEFAULT_MAX_NODES, GraphEngine, GraphSnapshot,
    ReadyQuery, ReadyTask, Relation, TaskStore, TreeNode, TreeOptions,
};
pub use error::{DbError, DbResult};
pub use models::{Priority, Status, Task};
pub use repository::{RelationshipRepository, TaskFilter, TaskLister, TaskRepository};

use std::path::{Path, PathBuf};
use std::process::Command;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, SurrealKv};

/// Default database path relative to project root or current working directory
pub const DEFAULT_DB_PATH: &str = ".trellis/data";

/// Database wrapper providing connection management for SurrealDB
pub struct Database {
    /// The underlying SurrealDB client
    client: Surreal<Db>,
    /// Path where the database is stored
    path: PathBuf,
}

impl Database {
    /// Connect to a SurrealDB database at the specified path.
    ///
    /// Creates the database directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DbError::CreateDirectory` if directory creation fails.
    /// Returns `DbError::Connection` if database connection fails.
    pub async fn connect(path: &Path) -> DbResult<Self> {
        let path = Self::prepare_path(path)?;

        let client =
            Surreal::new::<SurrealKv>(path.clone())
                .await
                .map_err(|e| DbError::Connection {
                    path: path.clone(),
                    source: Box::new(e),
                })?;

        tracing::debug!("Connected to database at {}", path.display());
        Ok(Self { client, path })
    }

    /// Initialize the database schema.
    ///
    /// Selects the Trellis namespace and database, then defines the task
    /// table and graph relations.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Schema` if schema initialization fails.
    pub async fn init(&self) -> DbResult<()> {
        self.client
            .use_ns("trellis")
            .use_db("main")
            .await
            .map_err(|e| DbError::Schema(Box::new(e)))?;

        schema::init_schema(&self.client).await?;

        Ok(())
    }

    /// Get a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Db> {
        &self.client
    }

    /// Get the path where the database is stored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Repository for task records
    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository::new(&self.client)
    }

    /// Repository for dependency and subtask edges
    pub fn relationships(&self) -> RelationshipRepository<'_> {
        RelationshipRepository::new(&self.client)
    }

    /// Filtered task listing
    pub fn lister(&self) -> TaskLister<'_> {
        TaskLister::new(&self.client)
    }

    /// Graph engine reading from this database
    pub fn graph(&self) -> GraphEngine<'_, Self> {
        GraphEngine::new(self)
    }

    /// Get the default database path based on project root.
    ///
    /// Uses `git rev-parse --show-toplevel` to find the project root and
    /// returns `<project_root>/.trellis/data`. If not in a git repository,
    /// falls back to `.trellis/data` relative to the current working directory.
    pub fn default_path() -> DbResult<PathBuf> {
        let base_path = find_project_root().unwrap_or_else(|| PathBuf::from("."));
        Ok(base_path.join(DEFAULT_DB_PATH))
    }

    /// Prepare the database path by validating and creating directories.
    fn prepare_path(path: &Path) -> DbResult<PathBuf> {
        let path = path.to_path_buf();

        if path.exists() && !path.is_dir() {
            return Err(DbError::InvalidPath {
                path,
                reason: "not a directory".to_string(),
            });
        }

        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|e| DbError::CreateDirectory {
                path: path.clone(),
                source: e,
            })?;
        }

        Ok(path)
    }
}

static_assertions::assert_impl_all!(Database: Send, Sync);

/// Find the project root by running `git rev-parse --show-toplevel`.
///
/// Returns `None` if not in a git repository or the command fails.
pub fn find_project_root() -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;

    if output.status.success() {
        let path_str = String::from_utf8(output.stdout).ok()?;
        Some(PathBuf::from(path_str.trim()))
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_path() {
        let path = Database::default_path().unwrap();
        assert!(
            path.ends_with(".trellis/data"),
            "Path should end with .trellis/data, got: {:?}",
            path
        );
    }

    #[test]
    fn test_default_db_path_constant() {
        assert_eq!(DEFAULT_DB_PATH, ".trellis/data");
    }

    #[tokio::test]
    async fn test_connect_and_init() {
        let temp_dir = env::temp_dir().join(format!("trellis-test-{}", std::process::id()));

        let db = Database::connect(&temp_dir).await;
        assert!(db.is_ok(), "Failed to connect: {:?}", db.err());
        let db = db.unwrap();

        assert_eq!(db.path(), temp_dir);

        let init_result = db.init().await;
        assert!(
            init_result.is_ok(),
            "Failed to init: {:?}",
            init_result.err()
        );

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn test_prepare_path_creates_directories() {
        let temp_dir = env::temp_dir().join(format!(
            "trellis-test-prepare-{}/sub/dir",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(temp_dir.parent().unwrap().parent().unwrap());

        let result = Database::prepare_path(&temp_dir);
        assert!(result.is_ok());
        assert!(temp_dir.exists());

        let _ = std::fs::remove_dir_all(temp_dir.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_prepare_path_rejects_file() {
        let file_path =
            env::temp_dir().join(format!("trellis-test-file-{}", std::process::id()));
        std::fs::write(&file_path, b"not a db").unwrap();

        let result = Database::prepare_path(&file_path);
        assert!(matches!(result, Err(DbError::InvalidPath { .. })));

        let _ = std::fs::remove_file(&file_path);
    }
}

//! Test infrastructure for integration tests
//!
//! Provides isolated database setup/teardown and CLI command execution helpers.
//! Each test gets its own database instance to ensure no shared state.

use std::path::PathBuf;
use trellis_cli::commands::{
    AddCommand, CriticalPathCommand, CyclesCommand, DependCommand, ReadyCommand, StatusCommand,
    TreeCommand, UndependCommand,
};
use trellis_db::{DEFAULT_MAX_NODES, Database, Priority, Status};

/// Test context containing an isolated database and temp directory
pub struct TestContext {
    pub db: Database,
    pub temp_dir: PathBuf,
}

impl TestContext {
    /// Create a new test context with an isolated database.
    ///
    /// Each call creates a uniquely named temp directory using process ID,
    /// thread ID, and nanosecond timestamp to guarantee isolation.
    pub async fn new() -> Self {
        let temp_dir = std::env::temp_dir().join(format!(
            "trellis-integration-test-{}-{:?}-{}",
            std::process::id(),
            std::thread::current().id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let db = Database::connect(&temp_dir).await.unwrap();
        db.init().await.unwrap();

        Self { db, temp_dir }
    }

    /// Add a task and return its display ID.
    pub async fn add(&self, name: &str, hours: Option<f64>, priority: Priority) -> String {
        let cmd = AddCommand {
            estimate: hours,
            priority: Some(priority),
            ..add_cmd(name)
        };
        cmd.execute(&self.db).await.unwrap().display_id
    }

    /// Make `task` depend on `blocker`.
    pub async fn depend(&self, task: &str, blocker: &str) {
        depend_cmd(task, blocker).execute(&self.db).await.unwrap();
    }

    /// Move `task` to `status`.
    pub async fn set_status(&self, task: &str, status: Status) {
        StatusCommand {
            id: task.to_string(),
            status,
        }
        .execute(&self.db)
        .await
        .unwrap();
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

// =============================================================================
// Command Builder Helpers
// =============================================================================

/// Create an AddCommand with default optional fields filled in.
pub fn add_cmd(name: &str) -> AddCommand {
    AddCommand {
        name: name.to_string(),
        priority: None,
        estimate: None,
        category: None,
        assignee: None,
        tags: vec![],
        parent: None,
        depends_on: vec![],
    }
}

pub fn depend_cmd(task: &str, blocker: &str) -> DependCommand {
    DependCommand {
        id: task.to_string(),
        blocker_id: blocker.to_string(),
    }
}

pub fn undepend_cmd(task: &str, blocker: &str) -> UndependCommand {
    UndependCommand {
        id: task.to_string(),
        blocker_id: blocker.to_string(),
    }
}

/// Create a TreeCommand rooted at `id` (or the forest when `None`).
pub fn tree_cmd(id: Option<&str>) -> TreeCommand {
    TreeCommand {
        id: id.map(str::to_string),
        depth: None,
        relations: None,
        max_nodes: DEFAULT_MAX_NODES,
        json: false,
    }
}

pub fn cycles_cmd(id: Option<&str>) -> CyclesCommand {
    CyclesCommand {
        id: id.map(str::to_string),
        json: false,
    }
}

pub fn critical_path_cmd(id: &str) -> CriticalPathCommand {
    CriticalPathCommand {
        id: id.to_string(),
        remaining: false,
        json: false,
    }
}

pub fn ready_cmd() -> ReadyCommand {
    ReadyCommand {
        category: None,
        assignee: None,
        limit: None,
        json: false,
    }
}

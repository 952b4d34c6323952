use std::path::PathBuf;
use thiserror::Error;

/// Database and graph engine error types for Trellis
#[derive(Error, Debug)]
pub enum DbError {
    /// Error establishing connection to the database
    #[error("Failed to connect to database at {path}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: Box<surrealdb::Error>,
    },

    /// Error during schema initialization
    #[error("Failed to initialize database schema: {0}")]
    Schema(#[source] Box<surrealdb::Error>),

    /// Error executing a query (the store is unavailable or rejected the call)
    #[error("Query execution failed")]
    Query(#[source] Box<surrealdb::Error>),

    /// Error with database path (invalid or inaccessible)
    #[error("Invalid database path: {path} - {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Error when a requested task was not found
    #[error("Task '{task_id}' not found")]
    NotFound { task_id: String },

    /// Error creating database directory
    #[error("Failed to create database directory at {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dependency subgraph reachable from a task is not acyclic
    #[error("Dependency graph reachable from '{task_id}' contains a cycle: {}", .cycle.join(" -> "))]
    CyclicGraph { task_id: String, cycle: Vec<String> },

    /// A graph query parameter was rejected before traversal began
    #[error("Invalid value for {name}: {message}")]
    InvalidParameter { name: String, message: String },

    /// Error for invalid input or validation failure
    #[error("{message}")]
    ValidationError { message: String },
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        DbError::Query(Box::new(err))
    }
}

impl DbError {
    /// Get the full error message including nested SurrealDB error details.
    ///
    /// This is useful for displaying detailed error information to users.
    pub fn full_message(&self) -> String {
        match self {
            DbError::Query(err) => format!("Query execution failed: {}", err),
            other => other.to_string(),
        }
    }

    /// Whether this error came from the underlying store rather than from
    /// the data or the caller's parameters.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            DbError::Connection { .. } | DbError::Schema(_) | DbError::Query(_)
        )
    }

    /// One-line message for the command line, with store failures labelled.
    pub fn cli_message(&self) -> String {
        if self.is_store_failure() {
            format!("store failure: {}", self.full_message())
        } else {
            self.full_message()
        }
    }

    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        DbError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;

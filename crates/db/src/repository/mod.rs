//! Repository modules for database operations
//!
//! Provides repository pattern implementations for task and relationship
//! operations, encapsulating database queries.

mod filter;
mod relationship;
mod task;

pub use filter::{TaskFilter, TaskLister};
pub use relationship::RelationshipRepository;
pub use task::TaskRepository;

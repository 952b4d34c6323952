//! Data models for Trellis task tracking
//!
//! Defines Rust types that map to the SurrealDB schema for tasks
//! and the enums the graph engine reasons about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

/// Prefix of generated display IDs (`T-0001`)
pub const DISPLAY_ID_PREFIX: &str = "T-";

/// Sort key that orders display IDs by their sequence number.
///
/// `T-9999` sorts before `T-10000`. IDs without a numeric sequence sort
/// after every numbered one, then by their text.
pub fn display_id_order(display_id: &str) -> (u64, &str) {
    let sequence = display_id
        .strip_prefix(DISPLAY_ID_PREFIX)
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(u64::MAX);
    (sequence, display_id)
}

/// Task status
///
/// Represents the current state of a task in its lifecycle.
/// Only `Completed` satisfies a dependency; `Completed` and `Archived`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Todo,
    InProgress,
    Paused,
    Blocked,
    Completed,
    Archived,
}

impl Status {
    /// All statuses, in lifecycle order
    pub const ALL: [Status; 6] = [
        Status::Todo,
        Status::InProgress,
        Status::Paused,
        Status::Blocked,
        Status::Completed,
        Status::Archived,
    ];

    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Paused => "paused",
            Status::Blocked => "blocked",
            Status::Completed => "completed",
            Status::Archived => "archived",
        }
    }

    /// Parse a status from its database representation
    pub fn parse(s: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Whether the task has left the active graph
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Archived)
    }

    /// Whether a task in this status unblocks the tasks depending on it
    pub fn satisfies_dependency(&self) -> bool {
        *self == Status::Completed
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a priority from its database representation
    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    /// Ordinal used for readiness scoring (higher ranks first)
    pub fn rank(&self) -> u32 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A task in the Trellis task tracking system
///
/// Tasks are the vertices of the graph, with relationships
/// defined by `child_of` and `depends_on` edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (SurrealDB record ID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,

    /// Human-facing sequence code, e.g. `T-0042`
    pub display_id: String,

    /// Short title
    pub name: String,

    /// Current status
    pub status: Status,

    /// Declared priority
    #[serde(default)]
    pub priority: Priority,

    /// Estimated effort in hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,

    /// Optional category used to narrow readiness scans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Optional assignee used to narrow readiness scans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// When this task was completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task with required fields
    pub fn new(display_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            display_id: display_id.into(),
            name: name.into(),
            status: Status::Todo,
            priority: Priority::Medium,
            estimated_hours: None,
            category: None,
            assignee: None,
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
            completed_at: None,
        }
    }

    /// Set the record ID of this task
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(Thing::from(("task", id)));
        self
    }

    /// Set the status of this task
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Set the priority of this task
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the estimated effort in hours
    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// Set the category of this task
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the assignee of this task
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Add multiple tags to this task
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(|t| t.into()));
        self
    }

    /// The record key of this task (`abc123` for `task:abc123`), if stored.
    pub fn key(&self) -> Option<String> {
        self.id.as_ref().map(|thing| thing.id.to_string())
    }

    /// Estimated hours used as path weight; absent estimates weigh nothing.
    pub fn weight(&self) -> f64 {
        self.estimated_hours.unwrap_or(0.0).max(0.0)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.display_id == other.display_id
            && self.name == other.name
            && self.status == other.status
            && self.priority == other.priority
            && self.estimated_hours == other.estimated_hours
            && self.category == other.category
            && self.assignee == other.assignee
            && self.tags == other.tags
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work within a project.
///
/// Tasks live on the kanban board, partitioned by [`TaskStatus`], and may
/// optionally belong to a sprint via `sprint_id`. Sprint membership is a
/// derived fact: whether a task counts as sprint work is always recomputed
/// against the live sprint collection, so a `sprint_id` pointing at a deleted
/// sprint simply puts the task back in the backlog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Sprint membership. `None` (or a dangling id) means the task is in the
    /// project backlog.
    pub sprint_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Relative-effort estimate, non-negative.
    pub story_points: Option<f64>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The kind of work a task represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Story,
    Bug,
    Task,
    Epic,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Bug => "bug",
            Self::Task => "task",
            Self::Epic => "epic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "story" => Some(Self::Story),
            "bug" => Some(Self::Bug),
            "task" => Some(Self::Task),
            "epic" => Some(Self::Epic),
            _ => None,
        }
    }
}

/// The kanban column a task sits in.
///
/// Moving a card between columns is a status change on the task, never a
/// reorder of the underlying collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::InReview => "in-review",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in-progress" => Some(Self::InProgress),
            "in-review" => Some(Self::InReview),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// How urgently a task should be picked up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Input for creating a new task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub project_id: Uuid,
    pub sprint_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `Task` if not specified.
    pub kind: Option<TaskKind>,
    /// Defaults to `Todo` if not specified.
    pub status: Option<TaskStatus>,
    /// Defaults to `Medium` if not specified.
    pub priority: Option<TaskPriority>,
    pub story_points: Option<f64>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub due_date: Option<NaiveDate>,
}

/// Input for updating a task. All fields are optional for partial updates;
/// the double-option fields accept an explicit `null` to clear the value
/// (e.g. `"sprint_id": null` moves a task back to the backlog).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub sprint_id: Option<Option<Uuid>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub assignee_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub description: Option<Option<String>>,
    pub kind: Option<TaskKind>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub story_points: Option<Option<f64>>,
    pub labels: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub due_date: Option<Option<NaiveDate>>,
}

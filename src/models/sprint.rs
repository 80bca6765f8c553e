use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A time-boxed iteration over a subset of a project's tasks.
///
/// Tasks join a sprint through their `sprint_id`; the sprint itself holds no
/// membership list. At most one sprint per project should be active at a
/// time — [`crate::store::Store::start_sprint`] owns that invariant by
/// completing any previously active sprint when a new one starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    /// What the sprint sets out to achieve.
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    /// Inclusive end of the sprint window; never before `start_date`.
    pub end_date: NaiveDate,
    /// Declared available effort in hours, independent of story points.
    pub capacity: f64,
    pub status: SprintStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The lifecycle state of a sprint.
///
/// - `Planned`: scheduled but not started
/// - `Active`: currently running
/// - `Completed`: finished; counts toward velocity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    Planned,
    Active,
    Completed,
}

impl SprintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(Self::Planned),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Input for creating a new sprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSprintInput {
    pub project_id: Uuid,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Defaults to 0 if not specified.
    pub capacity: Option<f64>,
    /// Defaults to `Planned` if not specified.
    pub status: Option<SprintStatus>,
}

/// Input for updating a sprint. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSprintInput {
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub goal: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub capacity: Option<f64>,
    pub status: Option<SprintStatus>,
}

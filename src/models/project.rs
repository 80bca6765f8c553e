use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback color for projects created without one.
pub const DEFAULT_PROJECT_COLOR: &str = "#6366f1";

/// A project containing tasks and sprints.
///
/// Projects are the top-level organizational unit. Each project carries a
/// short uppercase key (e.g. `DEMO`) used as a human-readable handle; the key
/// must be unique across all projects, enforced at the API boundary rather
/// than in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Short unique handle, 2-6 uppercase letters or digits.
    pub key: String,
    /// Display color as a hex string (e.g. `#6366f1`).
    pub color: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    /// Short unique handle, 2-6 uppercase letters or digits.
    pub key: String,
    /// Defaults to [`DEFAULT_PROJECT_COLOR`] if not specified.
    pub color: Option<String>,
    pub description: Option<String>,
}

/// Input for updating an existing project. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub key: Option<String>,
    pub color: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub description: Option<Option<String>>,
}

/// Whether `key` has the required project-key shape: 2-6 uppercase ASCII
/// letters or digits.
pub fn valid_project_key(key: &str) -> bool {
    (2..=6).contains(&key.len())
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uppercase_alphanumeric_keys() {
        assert!(valid_project_key("DEMO"));
        assert!(valid_project_key("OPS2"));
        assert!(valid_project_key("AB"));
        assert!(valid_project_key("ABCDEF"));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(!valid_project_key("A"));
        assert!(!valid_project_key("ABCDEFG"));
        assert!(!valid_project_key("demo"));
        assert!(!valid_project_key("DE-MO"));
        assert!(!valid_project_key(""));
    }
}

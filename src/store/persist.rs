//! The persistence bridge: durable JSON slot plus bulk export/import.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::State;
use crate::models::{Project, Sprint, Task, User};

/// Format version written into export documents.
pub const EXPORT_VERSION: &str = "1.0";

/// On-disk shape of the durable slot.
///
/// Only the selected project survives a restart; the selected sprint is
/// transient UI state and is intentionally absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub sprints: Vec<Sprint>,
    pub users: Vec<User>,
    pub selected_project_id: Option<Uuid>,
}

impl From<&State> for Snapshot {
    fn from(state: &State) -> Self {
        Self {
            projects: state.projects.clone(),
            tasks: state.tasks.clone(),
            sprints: state.sprints.clone(),
            users: state.users.clone(),
            selected_project_id: state.selected_project_id,
        }
    }
}

impl From<Snapshot> for State {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            projects: snapshot.projects,
            tasks: snapshot.tasks,
            sprints: snapshot.sprints,
            users: snapshot.users,
            selected_project_id: snapshot.selected_project_id,
            selected_sprint_id: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Platform-default location of the durable slot.
pub fn default_slot_path() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "taskflow")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("taskflow.json"))
}

/// Restore the slot at `path`. A missing file yields an empty state; an
/// unreadable or unparseable one is discarded with a warning so a corrupt
/// slot never takes the application down.
pub fn load(path: &Path) -> State {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return State::default(),
        Err(e) => {
            tracing::warn!("failed to read store slot {}: {e}", path.display());
            return State::default();
        }
    };
    match serde_json::from_str::<Snapshot>(&raw) {
        Ok(snapshot) => snapshot.into(),
        Err(e) => {
            tracing::warn!("discarding corrupt store slot {}: {e}", path.display());
            State::default()
        }
    }
}

/// Write the slot atomically: serialize to a sibling temp file, then rename
/// over the previous slot so a crash mid-write cannot corrupt it.
pub fn save(path: &Path, state: &State) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&Snapshot::from(state))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Bulk export file: the full set of collections plus format metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub sprints: Vec<Sprint>,
    pub users: Vec<User>,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read import file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed import file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Per-collection record counts of an applied import.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportSummary {
    pub projects: usize,
    pub tasks: usize,
    pub sprints: usize,
    pub users: usize,
}

pub fn export(state: &State) -> ExportDocument {
    ExportDocument {
        version: EXPORT_VERSION.to_string(),
        export_date: Utc::now(),
        projects: state.projects.clone(),
        tasks: state.tasks.clone(),
        sprints: state.sprints.clone(),
        users: state.users.clone(),
    }
}

/// Parse a raw export document. Fails before any store mutation, so a
/// malformed file leaves existing data untouched.
pub fn parse_export(raw: &str) -> Result<ExportDocument, ImportError> {
    Ok(serde_json::from_str(raw)?)
}

/// Append the document's records to `state`, re-assigning a fresh id to
/// every incoming record to avoid colliding with existing data. References
/// are remapped through the old-to-new table; a reference to a record absent
/// from the file is carried over unchanged (dangling in, dangling out).
pub(super) fn import_into(state: &mut State, doc: ExportDocument) -> ImportSummary {
    let mut ids: HashMap<Uuid, Uuid> = HashMap::new();
    for project in &doc.projects {
        ids.insert(project.id, Uuid::new_v4());
    }
    for task in &doc.tasks {
        ids.insert(task.id, Uuid::new_v4());
    }
    for sprint in &doc.sprints {
        ids.insert(sprint.id, Uuid::new_v4());
    }
    for user in &doc.users {
        ids.insert(user.id, Uuid::new_v4());
    }
    let remap = |id: Uuid| ids.get(&id).copied().unwrap_or(id);

    let mut summary = ImportSummary::default();
    for mut project in doc.projects {
        project.id = remap(project.id);
        state.projects.push(project);
        summary.projects += 1;
    }
    for mut sprint in doc.sprints {
        sprint.id = remap(sprint.id);
        sprint.project_id = remap(sprint.project_id);
        state.sprints.push(sprint);
        summary.sprints += 1;
    }
    for mut user in doc.users {
        user.id = remap(user.id);
        state.users.push(user);
        summary.users += 1;
    }
    for mut task in doc.tasks {
        task.id = remap(task.id);
        task.project_id = remap(task.project_id);
        task.sprint_id = task.sprint_id.map(remap);
        task.assignee_id = task.assignee_id.map(remap);
        state.tasks.push(task);
        summary.tasks += 1;
    }
    summary
}

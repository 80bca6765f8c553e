use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::models::*;
use crate::projections;
use crate::store::{ExportDocument, ImportSummary, Store};

// ============================================================
// Error Handling
// ============================================================

fn bad_request(msg: impl Into<String>) -> (StatusCode, String) {
    let msg = msg.into();
    tracing::warn!("Validation error: {}", msg);
    (StatusCode::BAD_REQUEST, msg)
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

/// Project-key validation lives here, at the form boundary: the store itself
/// accepts anything.
fn validate_project_key(
    store: &Store,
    key: &str,
    ignore: Option<Uuid>,
) -> Result<(), (StatusCode, String)> {
    if !valid_project_key(key) {
        return Err(bad_request(
            "Project key must be 2-6 uppercase letters or digits",
        ));
    }
    if store
        .projects()
        .iter()
        .any(|p| p.key == key && Some(p.id) != ignore)
    {
        return Err(bad_request(format!("Project key '{key}' is already in use")));
    }
    Ok(())
}

fn validate_story_points(points: Option<f64>) -> Result<(), (StatusCode, String)> {
    match points {
        Some(p) if p < 0.0 => Err(bad_request("Story points must be non-negative")),
        _ => Ok(()),
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Canned payload for API areas the product has not built out yet.
pub async fn placeholder() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "coming soon" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(State(store): State<Store>) -> Json<Vec<Project>> {
    Json(store.projects())
}

pub async fn get_project(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, (StatusCode, String)> {
    store
        .get_project(id)
        .map(Json)
        .ok_or_else(|| not_found("Project"))
}

pub async fn create_project(
    State(store): State<Store>,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, String)> {
    validate_project_key(&store, &input.key, None)?;
    Ok((StatusCode::CREATED, Json(store.add_project(input))))
}

pub async fn update_project(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<Json<Project>, (StatusCode, String)> {
    if let Some(key) = &input.key {
        validate_project_key(&store, key, Some(id))?;
    }
    store
        .update_project(id, input)
        .map(Json)
        .ok_or_else(|| not_found("Project"))
}

pub async fn delete_project(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if store.delete_project(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Project"))
    }
}

pub async fn list_project_tasks(
    State(store): State<Store>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    store
        .get_project(project_id)
        .ok_or_else(|| not_found("Project"))?;
    Ok(Json(store.tasks_by_project(project_id)))
}

pub async fn list_project_sprints(
    State(store): State<Store>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Sprint>>, (StatusCode, String)> {
    store
        .get_project(project_id)
        .ok_or_else(|| not_found("Project"))?;
    Ok(Json(store.sprints_by_project(project_id)))
}

pub async fn project_board(
    State(store): State<Store>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<projections::Board>, (StatusCode, String)> {
    store
        .get_project(project_id)
        .ok_or_else(|| not_found("Project"))?;
    let state = store.snapshot();
    Ok(Json(projections::board_columns(
        &state.tasks,
        Some(project_id),
    )))
}

pub async fn project_backlog(
    State(store): State<Store>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    store
        .get_project(project_id)
        .ok_or_else(|| not_found("Project"))?;
    let state = store.snapshot();
    Ok(Json(projections::backlog(
        &state.tasks,
        &state.sprints,
        project_id,
    )))
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(State(store): State<Store>) -> Json<Vec<Task>> {
    Json(store.tasks())
}

pub async fn get_task(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, (StatusCode, String)> {
    store.get_task(id).map(Json).ok_or_else(|| not_found("Task"))
}

pub async fn create_task(
    State(store): State<Store>,
    Json(input): Json<CreateTaskInput>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    validate_story_points(input.story_points)?;
    Ok((StatusCode::CREATED, Json(store.add_task(input))))
}

pub async fn update_task(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    if let Some(points) = input.story_points {
        validate_story_points(points)?;
    }
    store
        .update_task(id, input)
        .map(Json)
        .ok_or_else(|| not_found("Task"))
}

pub async fn delete_task(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if store.delete_task(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Task"))
    }
}

// ============================================================
// Sprints
// ============================================================

pub async fn list_sprints(State(store): State<Store>) -> Json<Vec<Sprint>> {
    Json(store.sprints())
}

pub async fn get_sprint(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sprint>, (StatusCode, String)> {
    store
        .get_sprint(id)
        .map(Json)
        .ok_or_else(|| not_found("Sprint"))
}

pub async fn create_sprint(
    State(store): State<Store>,
    Json(input): Json<CreateSprintInput>,
) -> Result<(StatusCode, Json<Sprint>), (StatusCode, String)> {
    if input.end_date < input.start_date {
        return Err(bad_request("Sprint end date must not be before its start"));
    }
    if input.capacity.is_some_and(|c| c < 0.0) {
        return Err(bad_request("Sprint capacity must be non-negative"));
    }
    Ok((StatusCode::CREATED, Json(store.add_sprint(input))))
}

pub async fn update_sprint(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSprintInput>,
) -> Result<Json<Sprint>, (StatusCode, String)> {
    let existing = store.get_sprint(id).ok_or_else(|| not_found("Sprint"))?;
    let start = input.start_date.unwrap_or(existing.start_date);
    let end = input.end_date.unwrap_or(existing.end_date);
    if end < start {
        return Err(bad_request("Sprint end date must not be before its start"));
    }
    if input.capacity.is_some_and(|c| c < 0.0) {
        return Err(bad_request("Sprint capacity must be non-negative"));
    }
    store
        .update_sprint(id, input)
        .map(Json)
        .ok_or_else(|| not_found("Sprint"))
}

pub async fn delete_sprint(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if store.delete_sprint(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Sprint"))
    }
}

pub async fn start_sprint(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sprint>, (StatusCode, String)> {
    store
        .start_sprint(id)
        .map(Json)
        .ok_or_else(|| not_found("Sprint"))
}

// ============================================================
// Users
// ============================================================

pub async fn list_users(State(store): State<Store>) -> Json<Vec<User>> {
    Json(store.users())
}

pub async fn get_user(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, (StatusCode, String)> {
    store.get_user(id).map(Json).ok_or_else(|| not_found("User"))
}

pub async fn create_user(
    State(store): State<Store>,
    Json(input): Json<CreateUserInput>,
) -> (StatusCode, Json<User>) {
    (StatusCode::CREATED, Json(store.add_user(input)))
}

pub async fn update_user(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<User>, (StatusCode, String)> {
    store
        .update_user(id, input)
        .map(Json)
        .ok_or_else(|| not_found("User"))
}

pub async fn delete_user(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if store.delete_user(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("User"))
    }
}

// ============================================================
// Selection
// ============================================================

/// The selected project/sprint pair the client tree renders from.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResponse {
    pub selected_project_id: Option<Uuid>,
    pub selected_sprint_id: Option<Uuid>,
}

pub async fn get_selection(State(store): State<Store>) -> Json<SelectionResponse> {
    Json(SelectionResponse {
        selected_project_id: store.selected_project(),
        selected_sprint_id: store.selected_sprint(),
    })
}

pub async fn select_project(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    store.get_project(id).ok_or_else(|| not_found("Project"))?;
    store.set_selected_project(Some(id));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn select_sprint(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    store.get_sprint(id).ok_or_else(|| not_found("Sprint"))?;
    store.set_selected_sprint(Some(id));
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Analytics
// ============================================================

pub async fn project_velocity(
    State(store): State<Store>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<projections::VelocityReport>, (StatusCode, String)> {
    store
        .get_project(project_id)
        .ok_or_else(|| not_found("Project"))?;
    let state = store.snapshot();
    Ok(Json(projections::velocity(
        project_id,
        &state.sprints,
        &state.tasks,
    )))
}

pub async fn sprint_progress(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<projections::SprintProgress>, (StatusCode, String)> {
    let sprint = store.get_sprint(id).ok_or_else(|| not_found("Sprint"))?;
    let state = store.snapshot();
    Ok(Json(projections::sprint_progress(
        &sprint,
        &state.tasks,
        Utc::now().date_naive(),
    )))
}

pub async fn sprint_burndown(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<projections::BurndownReport>, (StatusCode, String)> {
    let sprint = store.get_sprint(id).ok_or_else(|| not_found("Sprint"))?;
    let state = store.snapshot();
    Ok(Json(projections::burndown(&sprint, &state.tasks)))
}

// ============================================================
// Bulk export / import
// ============================================================

pub async fn export_data(State(store): State<Store>) -> Json<ExportDocument> {
    Json(store.export())
}

/// Malformed documents are rejected by the `Json` extractor before the store
/// is touched; a parsed document always applies in full.
pub async fn import_data(
    State(store): State<Store>,
    Json(doc): Json<ExportDocument>,
) -> (StatusCode, Json<ImportSummary>) {
    (StatusCode::CREATED, Json(store.import(doc)))
}

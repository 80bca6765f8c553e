//! The domain store: single source of truth for all entity collections.
//!
//! [`Store`] owns the projects, tasks, sprints, and users plus the
//! currently-selected project/sprint, all behind one lock so a reader never
//! observes a partially-applied mutation. Every mutation stamps timestamps,
//! rewrites the durable slot, and then notifies subscribers. Mutators are
//! infallible for structurally valid input: unknown ids are silent no-ops
//! and referential integrity is not checked at write time.

mod persist;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::models::*;

pub use persist::{
    default_slot_path, parse_export, ExportDocument, ImportError, ImportSummary, PersistError,
    Snapshot, EXPORT_VERSION,
};

/// A consistent copy of everything the store holds.
///
/// Projections take a `State` (or slices of it) rather than the live store,
/// so derived views are referentially transparent given the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub sprints: Vec<Sprint>,
    pub users: Vec<User>,
    pub selected_project_id: Option<Uuid>,
    pub selected_sprint_id: Option<Uuid>,
}

/// Handle returned by [`Store::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn() + Send + Sync>;

struct Inner {
    state: State,
    slot: Option<PathBuf>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl Inner {
    fn persist(&self) {
        let Some(path) = &self.slot else { return };
        if let Err(e) = persist::save(path, &self.state) {
            tracing::warn!("failed to persist store slot {}: {e}", path.display());
        }
    }
}

pub struct Store {
    inner: Arc<Mutex<Inner>>,
}

impl Store {
    /// Open a store backed by the JSON slot at `path`.
    ///
    /// The slot is restored before the store is handed out, so the first
    /// reader already sees the previous session's data. A missing or corrupt
    /// slot degrades to an empty store rather than an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = persist::load(&path);
        Self::new(state, Some(path))
    }

    /// Open a store backed by the platform-default slot location.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::open(persist::default_slot_path()?))
    }

    /// Open a store with no durable slot. Used by tests and ephemeral tools.
    pub fn open_memory() -> Self {
        Self::new(State::default(), None)
    }

    fn new(state: State, slot: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                slot,
                subscribers: Vec::new(),
                next_subscription: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store lock poisoned")
    }

    /// Apply `f` under the lock, rewrite the slot, then notify subscribers
    /// with the lock released (a subscriber is free to read the store).
    fn mutate<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let (result, subscribers) = {
            let mut inner = self.lock();
            let result = f(&mut inner.state);
            inner.persist();
            let subscribers: Vec<Subscriber> =
                inner.subscribers.iter().map(|(_, s)| s.clone()).collect();
            (result, subscribers)
        };
        for subscriber in &subscribers {
            (subscriber.as_ref())();
        }
        result
    }

    // ============================================================
    // Snapshot and subscriptions
    // ============================================================

    /// A consistent clone of all collections plus selection state.
    pub fn snapshot(&self) -> State {
        self.lock().state.clone()
    }

    /// Register a change callback, fired after every mutation. Returns a
    /// handle for [`Store::unsubscribe`].
    pub fn subscribe(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.subscribers.push((id, Arc::new(f)));
        id
    }

    /// Remove a subscriber. Unsubscribing twice is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().subscribers.retain(|(sid, _)| *sid != id);
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn projects(&self) -> Vec<Project> {
        self.lock().state.projects.clone()
    }

    pub fn get_project(&self, id: Uuid) -> Option<Project> {
        self.lock().state.projects.iter().find(|p| p.id == id).cloned()
    }

    /// Append a new project. If nothing is selected yet, the new project
    /// becomes the selected one.
    pub fn add_project(&self, input: CreateProjectInput) -> Project {
        self.mutate(|state| {
            let now = Utc::now();
            let project = Project {
                id: Uuid::new_v4(),
                name: input.name,
                key: input.key,
                color: input
                    .color
                    .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
                description: input.description,
                created_at: now,
                updated_at: now,
            };
            if state.selected_project_id.is_none() {
                state.selected_project_id = Some(project.id);
            }
            state.projects.push(project.clone());
            project
        })
    }

    /// Shallow-merge `input` into the project. Unknown ids are silently
    /// ignored and `None` is returned.
    pub fn update_project(&self, id: Uuid, input: UpdateProjectInput) -> Option<Project> {
        self.mutate(|state| {
            let project = state.projects.iter_mut().find(|p| p.id == id)?;
            if let Some(name) = input.name {
                project.name = name;
            }
            if let Some(key) = input.key {
                project.key = key;
            }
            if let Some(color) = input.color {
                project.color = color;
            }
            if let Some(description) = input.description {
                project.description = description;
            }
            project.updated_at = Utc::now();
            Some(project.clone())
        })
    }

    /// Remove a project and cascade removal of its tasks and sprints. If the
    /// deleted project was selected, selection falls back to the first
    /// remaining project, or to none.
    pub fn delete_project(&self, id: Uuid) -> bool {
        self.mutate(|state| {
            let before = state.projects.len();
            state.projects.retain(|p| p.id != id);
            if state.projects.len() == before {
                return false;
            }
            state.tasks.retain(|t| t.project_id != id);
            state.sprints.retain(|s| s.project_id != id);
            if state.selected_project_id == Some(id) {
                state.selected_project_id = state.projects.first().map(|p| p.id);
            }
            true
        })
    }

    // ============================================================
    // Task operations
    // ============================================================

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().state.tasks.clone()
    }

    pub fn get_task(&self, id: Uuid) -> Option<Task> {
        self.lock().state.tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn tasks_by_project(&self, project_id: Uuid) -> Vec<Task> {
        self.lock()
            .state
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn add_task(&self, input: CreateTaskInput) -> Task {
        self.mutate(|state| {
            let now = Utc::now();
            let task = Task {
                id: Uuid::new_v4(),
                project_id: input.project_id,
                sprint_id: input.sprint_id,
                assignee_id: input.assignee_id,
                title: input.title,
                description: input.description,
                kind: input.kind.unwrap_or(TaskKind::Task),
                status: input.status.unwrap_or(TaskStatus::Todo),
                priority: input.priority.unwrap_or(TaskPriority::Medium),
                story_points: input.story_points,
                labels: input.labels,
                due_date: input.due_date,
                created_at: now,
                updated_at: now,
            };
            state.tasks.push(task.clone());
            task
        })
    }

    pub fn update_task(&self, id: Uuid, input: UpdateTaskInput) -> Option<Task> {
        self.mutate(|state| {
            let task = state.tasks.iter_mut().find(|t| t.id == id)?;
            if let Some(sprint_id) = input.sprint_id {
                task.sprint_id = sprint_id;
            }
            if let Some(assignee_id) = input.assignee_id {
                task.assignee_id = assignee_id;
            }
            if let Some(title) = input.title {
                task.title = title;
            }
            if let Some(description) = input.description {
                task.description = description;
            }
            if let Some(kind) = input.kind {
                task.kind = kind;
            }
            if let Some(status) = input.status {
                task.status = status;
            }
            if let Some(priority) = input.priority {
                task.priority = priority;
            }
            if let Some(story_points) = input.story_points {
                task.story_points = story_points;
            }
            if let Some(labels) = input.labels {
                task.labels = labels;
            }
            if let Some(due_date) = input.due_date {
                task.due_date = due_date;
            }
            task.updated_at = Utc::now();
            Some(task.clone())
        })
    }

    pub fn delete_task(&self, id: Uuid) -> bool {
        self.mutate(|state| {
            let before = state.tasks.len();
            state.tasks.retain(|t| t.id != id);
            state.tasks.len() < before
        })
    }

    // ============================================================
    // Sprint operations
    // ============================================================

    pub fn sprints(&self) -> Vec<Sprint> {
        self.lock().state.sprints.clone()
    }

    pub fn get_sprint(&self, id: Uuid) -> Option<Sprint> {
        self.lock().state.sprints.iter().find(|s| s.id == id).cloned()
    }

    pub fn sprints_by_project(&self, project_id: Uuid) -> Vec<Sprint> {
        self.lock()
            .state
            .sprints
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn add_sprint(&self, input: CreateSprintInput) -> Sprint {
        self.mutate(|state| {
            let now = Utc::now();
            let sprint = Sprint {
                id: Uuid::new_v4(),
                project_id: input.project_id,
                name: input.name,
                goal: input.goal,
                start_date: input.start_date,
                end_date: input.end_date,
                capacity: input.capacity.unwrap_or(0.0),
                status: input.status.unwrap_or(SprintStatus::Planned),
                created_at: now,
                updated_at: now,
            };
            state.sprints.push(sprint.clone());
            sprint
        })
    }

    pub fn update_sprint(&self, id: Uuid, input: UpdateSprintInput) -> Option<Sprint> {
        self.mutate(|state| {
            let sprint = state.sprints.iter_mut().find(|s| s.id == id)?;
            if let Some(name) = input.name {
                sprint.name = name;
            }
            if let Some(goal) = input.goal {
                sprint.goal = goal;
            }
            if let Some(start_date) = input.start_date {
                sprint.start_date = start_date;
            }
            if let Some(end_date) = input.end_date {
                sprint.end_date = end_date;
            }
            if let Some(capacity) = input.capacity {
                sprint.capacity = capacity;
            }
            if let Some(status) = input.status {
                sprint.status = status;
            }
            sprint.updated_at = Utc::now();
            Some(sprint.clone())
        })
    }

    /// Remove a sprint. Member tasks keep their `sprint_id`; readers treat
    /// the now-dangling reference as backlog membership.
    pub fn delete_sprint(&self, id: Uuid) -> bool {
        self.mutate(|state| {
            let before = state.sprints.len();
            state.sprints.retain(|s| s.id != id);
            state.sprints.len() < before
        })
    }

    /// Mark a sprint active, completing any other active sprint of the same
    /// project so a project never has two sprints running at once.
    pub fn start_sprint(&self, id: Uuid) -> Option<Sprint> {
        self.mutate(|state| {
            let project_id = state.sprints.iter().find(|s| s.id == id)?.project_id;
            let now = Utc::now();
            for sprint in &mut state.sprints {
                if sprint.id != id
                    && sprint.project_id == project_id
                    && sprint.status == SprintStatus::Active
                {
                    sprint.status = SprintStatus::Completed;
                    sprint.updated_at = now;
                }
            }
            let sprint = state.sprints.iter_mut().find(|s| s.id == id)?;
            sprint.status = SprintStatus::Active;
            sprint.updated_at = now;
            Some(sprint.clone())
        })
    }

    // ============================================================
    // User operations
    // ============================================================

    pub fn users(&self) -> Vec<User> {
        self.lock().state.users.clone()
    }

    pub fn get_user(&self, id: Uuid) -> Option<User> {
        self.lock().state.users.iter().find(|u| u.id == id).cloned()
    }

    pub fn add_user(&self, input: CreateUserInput) -> User {
        self.mutate(|state| {
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                name: input.name,
                email: input.email,
                avatar_url: input.avatar_url,
                created_at: now,
                updated_at: now,
            };
            state.users.push(user.clone());
            user
        })
    }

    pub fn update_user(&self, id: Uuid, input: UpdateUserInput) -> Option<User> {
        self.mutate(|state| {
            let user = state.users.iter_mut().find(|u| u.id == id)?;
            if let Some(name) = input.name {
                user.name = name;
            }
            if let Some(email) = input.email {
                user.email = email;
            }
            if let Some(avatar_url) = input.avatar_url {
                user.avatar_url = avatar_url;
            }
            user.updated_at = Utc::now();
            Some(user.clone())
        })
    }

    pub fn delete_user(&self, id: Uuid) -> bool {
        self.mutate(|state| {
            let before = state.users.len();
            state.users.retain(|u| u.id != id);
            state.users.len() < before
        })
    }

    // ============================================================
    // Selection
    // ============================================================

    pub fn selected_project(&self) -> Option<Uuid> {
        self.lock().state.selected_project_id
    }

    pub fn selected_sprint(&self) -> Option<Uuid> {
        self.lock().state.selected_sprint_id
    }

    pub fn set_selected_project(&self, id: Option<Uuid>) {
        self.mutate(|state| state.selected_project_id = id);
    }

    pub fn set_selected_sprint(&self, id: Option<Uuid>) {
        self.mutate(|state| state.selected_sprint_id = id);
    }

    // ============================================================
    // Bulk export / import
    // ============================================================

    /// Produce a bulk export document of every collection.
    pub fn export(&self) -> ExportDocument {
        persist::export(&self.snapshot())
    }

    /// Append all records from `doc`, re-assigning fresh identifiers and
    /// remapping references between the imported records.
    pub fn import(&self, doc: ExportDocument) -> ImportSummary {
        self.mutate(|state| persist::import_into(state, doc))
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

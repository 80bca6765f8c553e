use serde::Serialize;
use uuid::Uuid;

use crate::models::{Sprint, Task, TaskStatus};

/// Tasks partitioned into the four kanban columns, preserving the relative
/// order of the source collection (insertion order, not priority order).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub in_review: Vec<Task>,
    pub done: Vec<Task>,
}

impl Board {
    pub fn total(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.in_review.len() + self.done.len()
    }
}

/// Partition `tasks` by status, optionally filtered to a single project.
/// Every task in the filtered set lands in exactly one column.
pub fn board_columns(tasks: &[Task], project_id: Option<Uuid>) -> Board {
    let mut board = Board::default();
    for task in tasks {
        if let Some(project_id) = project_id {
            if task.project_id != project_id {
                continue;
            }
        }
        let column = match task.status {
            TaskStatus::Todo => &mut board.todo,
            TaskStatus::InProgress => &mut board.in_progress,
            TaskStatus::InReview => &mut board.in_review,
            TaskStatus::Done => &mut board.done,
        };
        column.push(task.clone());
    }
    board
}

/// Tasks of `project_id` not committed to any live sprint and not yet done.
///
/// Sprint membership is recomputed against the sprint collection on every
/// call rather than stored on the task: a task whose `sprint_id` points at a
/// deleted sprint is back in the backlog.
pub fn backlog(tasks: &[Task], sprints: &[Sprint], project_id: Uuid) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.project_id == project_id)
        .filter(|t| t.status != TaskStatus::Done)
        .filter(|t| match t.sprint_id {
            Some(sprint_id) => !sprints.iter().any(|s| s.id == sprint_id),
            None => true,
        })
        .cloned()
        .collect()
}

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Sprint, SprintStatus, Task, TaskStatus};

/// Point totals and schedule position for one sprint.
#[derive(Debug, Clone, Serialize)]
pub struct SprintProgress {
    pub sprint_id: Uuid,
    /// Story points across all member tasks.
    pub planned_points: f64,
    /// Story points across member tasks that are done.
    pub completed_points: f64,
    /// `completed / planned × 100`, 0 when nothing is planned.
    pub percent_complete: f64,
    /// Calendar days until the end date, floored at zero once it has passed.
    pub days_remaining: i64,
    /// Past its end date without having been completed.
    pub overdue: bool,
}

/// Completed points for one finished sprint.
#[derive(Debug, Clone, Serialize)]
pub struct VelocityPoint {
    pub sprint_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub completed_points: f64,
}

/// Velocity series for a project, over its completed sprints.
#[derive(Debug, Clone, Serialize)]
pub struct VelocityReport {
    /// Completed sprints ascending by start date.
    pub sprints: Vec<VelocityPoint>,
    /// Mean completed points across all completed sprints.
    pub average: f64,
    /// Mean across the last three completed sprints.
    pub recent: f64,
    /// Most recent minus second most recent; 0 with fewer than two sprints.
    pub trend: f64,
}

/// One calendar day of a sprint's burndown.
#[derive(Debug, Clone, Serialize)]
pub struct BurndownDay {
    pub date: NaiveDate,
    pub ideal_remaining: f64,
    pub actual_remaining: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BurndownReport {
    pub sprint_id: Uuid,
    pub total_points: f64,
    pub days: Vec<BurndownDay>,
}

fn member_tasks<'a>(sprint_id: Uuid, tasks: &'a [Task]) -> impl Iterator<Item = &'a Task> {
    tasks.iter().filter(move |t| t.sprint_id == Some(sprint_id))
}

fn story_points_of(task: &Task) -> f64 {
    task.story_points.unwrap_or(0.0)
}

/// Planned/completed totals and schedule position for `sprint`.
pub fn sprint_progress(sprint: &Sprint, tasks: &[Task], today: NaiveDate) -> SprintProgress {
    let mut planned = 0.0;
    let mut completed = 0.0;
    for task in member_tasks(sprint.id, tasks) {
        planned += story_points_of(task);
        if task.status == TaskStatus::Done {
            completed += story_points_of(task);
        }
    }
    let percent_complete = if planned > 0.0 {
        completed / planned * 100.0
    } else {
        0.0
    };
    SprintProgress {
        sprint_id: sprint.id,
        planned_points: planned,
        completed_points: completed,
        percent_complete,
        days_remaining: (sprint.end_date - today).num_days().max(0),
        overdue: today > sprint.end_date && sprint.status != SprintStatus::Completed,
    }
}

/// Velocity series over the project's completed sprints.
pub fn velocity(project_id: Uuid, sprints: &[Sprint], tasks: &[Task]) -> VelocityReport {
    let mut completed: Vec<&Sprint> = sprints
        .iter()
        .filter(|s| s.project_id == project_id && s.status == SprintStatus::Completed)
        .collect();
    completed.sort_by_key(|s| s.start_date);

    let series: Vec<VelocityPoint> = completed
        .iter()
        .map(|sprint| VelocityPoint {
            sprint_id: sprint.id,
            name: sprint.name.clone(),
            start_date: sprint.start_date,
            completed_points: member_tasks(sprint.id, tasks)
                .filter(|t| t.status == TaskStatus::Done)
                .map(story_points_of)
                .sum(),
        })
        .collect();

    let mean = |window: &[VelocityPoint]| -> f64 {
        if window.is_empty() {
            0.0
        } else {
            window.iter().map(|p| p.completed_points).sum::<f64>() / window.len() as f64
        }
    };
    let average = mean(&series);
    let recent = mean(&series[series.len().saturating_sub(3)..]);
    let trend = if series.len() < 2 {
        0.0
    } else {
        series[series.len() - 1].completed_points - series[series.len() - 2].completed_points
    };

    VelocityReport {
        sprints: series,
        average,
        recent,
        trend,
    }
}

/// Day-by-day remaining points across `[start_date, end_date]` inclusive.
///
/// The ideal line descends linearly from the total to zero; a single-day
/// sprint goes directly to zero. The actual line uses the last-update time of
/// a done member task as a stand-in for its completion date — there is no
/// status-change history, so a task edited after it was finished shifts its
/// points later in the series. Treat the actual line as an approximation,
/// not authoritative history.
pub fn burndown(sprint: &Sprint, tasks: &[Task]) -> BurndownReport {
    let members: Vec<&Task> = member_tasks(sprint.id, tasks).collect();
    let total_points: f64 = members.iter().map(|t| story_points_of(t)).sum();

    let num_days = (sprint.end_date - sprint.start_date).num_days().max(0) + 1;
    let mut days = Vec::with_capacity(num_days as usize);
    for i in 0..num_days {
        let date = sprint.start_date + Duration::days(i);
        let ideal_remaining = if num_days == 1 {
            0.0
        } else {
            (total_points * (1.0 - i as f64 / (num_days - 1) as f64)).max(0.0)
        };
        let done_by_day: f64 = members
            .iter()
            .filter(|t| t.status == TaskStatus::Done && t.updated_at.date_naive() <= date)
            .map(|t| story_points_of(t))
            .sum();
        days.push(BurndownDay {
            date,
            ideal_remaining,
            actual_remaining: (total_points - done_by_day).max(0.0),
        });
    }

    BurndownReport {
        sprint_id: sprint.id,
        total_points,
        days,
    }
}

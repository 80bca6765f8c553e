use chrono::{DateTime, NaiveDate, Utc};
use speculate2::speculate;
use taskflow::models::*;
use taskflow::projections::{backlog, board_columns, burndown, sprint_progress, velocity};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn at_noon(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(12, 0, 0).expect("valid time").and_utc()
}

fn task_with(
    project_id: Uuid,
    status: TaskStatus,
    points: Option<f64>,
    sprint_id: Option<Uuid>,
) -> Task {
    let stamp = at_noon(date(2024, 1, 1));
    Task {
        id: Uuid::new_v4(),
        project_id,
        sprint_id,
        assignee_id: None,
        title: "Task".to_string(),
        description: None,
        kind: TaskKind::Story,
        status,
        priority: TaskPriority::Medium,
        story_points: points,
        labels: Vec::new(),
        due_date: None,
        created_at: stamp,
        updated_at: stamp,
    }
}

fn sprint_with(
    project_id: Uuid,
    status: SprintStatus,
    start: NaiveDate,
    end: NaiveDate,
) -> Sprint {
    let stamp = at_noon(start);
    Sprint {
        id: Uuid::new_v4(),
        project_id,
        name: "Sprint".to_string(),
        goal: None,
        start_date: start,
        end_date: end,
        capacity: 40.0,
        status,
        created_at: stamp,
        updated_at: stamp,
    }
}

speculate! {
    describe "kanban board" {
        it "partitions every task into exactly one column" {
            let project = Uuid::new_v4();
            let tasks = vec![
                task_with(project, TaskStatus::Todo, None, None),
                task_with(project, TaskStatus::InProgress, None, None),
                task_with(project, TaskStatus::InReview, None, None),
                task_with(project, TaskStatus::Done, None, None),
                task_with(project, TaskStatus::Todo, None, None),
            ];

            let board = board_columns(&tasks, Some(project));

            assert_eq!(board.total(), tasks.len());
            assert_eq!(board.todo.len(), 2);
            assert_eq!(board.in_progress.len(), 1);
            assert_eq!(board.in_review.len(), 1);
            assert_eq!(board.done.len(), 1);
        }

        it "preserves the source collection's order within a column" {
            let project = Uuid::new_v4();
            let mut first = task_with(project, TaskStatus::Todo, None, None);
            first.title = "first".to_string();
            first.priority = TaskPriority::Low;
            let mut second = task_with(project, TaskStatus::Todo, None, None);
            second.title = "second".to_string();
            second.priority = TaskPriority::Urgent;

            let board = board_columns(&[first, second], None);

            // Insertion order wins over priority.
            assert_eq!(board.todo[0].title, "first");
            assert_eq!(board.todo[1].title, "second");
        }

        it "filters to the requested project" {
            let ours = Uuid::new_v4();
            let theirs = Uuid::new_v4();
            let tasks = vec![
                task_with(ours, TaskStatus::Todo, None, None),
                task_with(theirs, TaskStatus::Todo, None, None),
            ];

            let board = board_columns(&tasks, Some(ours));

            assert_eq!(board.total(), 1);
            assert_eq!(board.todo[0].project_id, ours);
        }

        it "includes every project without a filter" {
            let tasks = vec![
                task_with(Uuid::new_v4(), TaskStatus::Todo, None, None),
                task_with(Uuid::new_v4(), TaskStatus::Done, None, None),
            ];

            assert_eq!(board_columns(&tasks, None).total(), 2);
        }
    }

    describe "backlog" {
        it "excludes tasks committed to a live sprint" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 7));
            let tasks = vec![
                task_with(project, TaskStatus::Todo, None, Some(sprint.id)),
                task_with(project, TaskStatus::Todo, None, None),
            ];

            let backlog_tasks = backlog(&tasks, &[sprint], project);

            assert_eq!(backlog_tasks.len(), 1);
            assert_eq!(backlog_tasks[0].sprint_id, None);
        }

        it "treats a dangling sprint reference as backlog membership" {
            let project = Uuid::new_v4();
            let tasks = vec![task_with(project, TaskStatus::Todo, None, Some(Uuid::new_v4()))];

            let backlog_tasks = backlog(&tasks, &[], project);

            assert_eq!(backlog_tasks.len(), 1);
        }

        it "excludes done tasks" {
            let project = Uuid::new_v4();
            let tasks = vec![
                task_with(project, TaskStatus::Done, None, None),
                task_with(project, TaskStatus::Todo, None, None),
            ];

            let backlog_tasks = backlog(&tasks, &[], project);

            assert_eq!(backlog_tasks.len(), 1);
            assert_eq!(backlog_tasks[0].status, TaskStatus::Todo);
        }

        it "excludes other projects' tasks" {
            let project = Uuid::new_v4();
            let tasks = vec![task_with(Uuid::new_v4(), TaskStatus::Todo, None, None)];

            assert!(backlog(&tasks, &[], project).is_empty());
        }
    }

    describe "sprint progress" {
        it "reports planned and completed points for a demo sprint" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 7));
            let tasks = vec![
                task_with(project, TaskStatus::Done, Some(5.0), Some(sprint.id)),
                task_with(project, TaskStatus::Todo, Some(3.0), Some(sprint.id)),
            ];

            let progress = sprint_progress(&sprint, &tasks, date(2024, 1, 3));

            assert_eq!(progress.planned_points, 8.0);
            assert_eq!(progress.completed_points, 5.0);
            assert!((progress.percent_complete - 62.5).abs() < 1e-9);
            assert_eq!(progress.days_remaining, 4);
            assert!(!progress.overdue);
        }

        it "reports zero percent when nothing is planned" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 7));

            let progress = sprint_progress(&sprint, &[], date(2024, 1, 3));

            assert_eq!(progress.planned_points, 0.0);
            assert_eq!(progress.percent_complete, 0.0);
        }

        it "floors days remaining at zero after the end date" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 7));

            let progress = sprint_progress(&sprint, &[], date(2024, 2, 1));

            assert_eq!(progress.days_remaining, 0);
            assert!(progress.overdue);
        }

        it "does not flag a completed sprint as overdue" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Completed, date(2024, 1, 1), date(2024, 1, 7));

            let progress = sprint_progress(&sprint, &[], date(2024, 2, 1));

            assert!(!progress.overdue);
        }

        it "ignores tasks outside the sprint" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 7));
            let tasks = vec![task_with(project, TaskStatus::Done, Some(13.0), None)];

            let progress = sprint_progress(&sprint, &tasks, date(2024, 1, 3));

            assert_eq!(progress.planned_points, 0.0);
        }
    }

    describe "velocity" {
        it "orders completed sprints by start date and computes the trend" {
            let project = Uuid::new_v4();
            let early = sprint_with(project, SprintStatus::Completed, date(2024, 1, 1), date(2024, 1, 7));
            let late = sprint_with(project, SprintStatus::Completed, date(2024, 2, 1), date(2024, 2, 7));
            let tasks = vec![
                task_with(project, TaskStatus::Done, Some(5.0), Some(early.id)),
                task_with(project, TaskStatus::Done, Some(8.0), Some(late.id)),
                task_with(project, TaskStatus::Todo, Some(3.0), Some(late.id)),
            ];

            // Collection order deliberately disagrees with start order.
            let report = velocity(project, &[late.clone(), early.clone()], &tasks);

            assert_eq!(report.sprints.len(), 2);
            assert_eq!(report.sprints[0].sprint_id, early.id);
            assert_eq!(report.sprints[0].completed_points, 5.0);
            assert_eq!(report.sprints[1].completed_points, 8.0);
            assert!((report.average - 6.5).abs() < 1e-9);
            assert!((report.trend - 3.0).abs() < 1e-9);
        }

        it "skips sprints that are not completed" {
            let project = Uuid::new_v4();
            let active = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 7));
            let tasks = vec![task_with(project, TaskStatus::Done, Some(5.0), Some(active.id))];

            let report = velocity(project, &[active], &tasks);

            assert!(report.sprints.is_empty());
            assert_eq!(report.average, 0.0);
        }

        it "reports zero trend with fewer than two data points" {
            let project = Uuid::new_v4();
            let only = sprint_with(project, SprintStatus::Completed, date(2024, 1, 1), date(2024, 1, 7));
            let tasks = vec![task_with(project, TaskStatus::Done, Some(5.0), Some(only.id))];

            let report = velocity(project, &[only], &tasks);

            assert_eq!(report.trend, 0.0);
            assert_eq!(report.average, 5.0);
        }

        it "averages the last three sprints for recent velocity" {
            let project = Uuid::new_v4();
            let mut sprints = Vec::new();
            let mut tasks = Vec::new();
            for (month, points) in [(1, 2.0), (2, 4.0), (3, 6.0), (4, 8.0)] {
                let sprint = sprint_with(
                    project,
                    SprintStatus::Completed,
                    date(2024, month, 1),
                    date(2024, month, 7),
                );
                tasks.push(task_with(project, TaskStatus::Done, Some(points), Some(sprint.id)));
                sprints.push(sprint);
            }

            let report = velocity(project, &sprints, &tasks);

            assert!((report.average - 5.0).abs() < 1e-9);
            assert!((report.recent - 6.0).abs() < 1e-9);
            assert!((report.trend - 2.0).abs() < 1e-9);
        }
    }

    describe "burndown" {
        it "produces one point per calendar day with linear ideal" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 7));
            let tasks = vec![
                task_with(project, TaskStatus::Todo, Some(6.0), Some(sprint.id)),
                task_with(project, TaskStatus::Todo, Some(6.0), Some(sprint.id)),
            ];

            let report = burndown(&sprint, &tasks);

            assert_eq!(report.days.len(), 7);
            assert_eq!(report.total_points, 12.0);
            assert!((report.days[0].ideal_remaining - 12.0).abs() < 1e-9);
            assert!((report.days[3].ideal_remaining - 6.0).abs() < 1e-9);
            assert!(report.days[6].ideal_remaining.abs() < 1e-9);
        }

        it "drops actual remaining on the day a task was last updated" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 7));
            let mut done = task_with(project, TaskStatus::Done, Some(5.0), Some(sprint.id));
            done.updated_at = at_noon(date(2024, 1, 3));
            let open = task_with(project, TaskStatus::Todo, Some(3.0), Some(sprint.id));

            let report = burndown(&sprint, &[done, open]);

            assert_eq!(report.days[0].actual_remaining, 8.0);
            assert_eq!(report.days[1].actual_remaining, 8.0);
            assert_eq!(report.days[2].actual_remaining, 3.0);
            assert_eq!(report.days[6].actual_remaining, 3.0);
        }

        it "sends a single-day sprint's ideal straight to zero" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 1));
            let tasks = vec![task_with(project, TaskStatus::Todo, Some(5.0), Some(sprint.id))];

            let report = burndown(&sprint, &tasks);

            assert_eq!(report.days.len(), 1);
            assert_eq!(report.days[0].ideal_remaining, 0.0);
            assert_eq!(report.total_points, 5.0);
        }

        it "counts tasks without estimates as zero points" {
            let project = Uuid::new_v4();
            let sprint = sprint_with(project, SprintStatus::Active, date(2024, 1, 1), date(2024, 1, 3));
            let tasks = vec![task_with(project, TaskStatus::Todo, None, Some(sprint.id))];

            let report = burndown(&sprint, &tasks);

            assert_eq!(report.total_points, 0.0);
            assert_eq!(report.days[0].actual_remaining, 0.0);
        }
    }
}

//! Sprint progress summary and coarse health label.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintHealth {
    Excellent,
    Good,
    Fair,
    Poor,
    AtRisk,
}

impl SprintHealth {
    /// Any overdue task wins over the completion percentage.
    pub fn classify(completion_percentage: f64, overdue_tasks: usize) -> Self {
        if overdue_tasks > 0 {
            SprintHealth::AtRisk
        } else if completion_percentage >= 90.0 {
            SprintHealth::Excellent
        } else if completion_percentage >= 70.0 {
            SprintHealth::Good
        } else if completion_percentage >= 50.0 {
            SprintHealth::Fair
        } else {
            SprintHealth::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SprintHealth::Excellent => "Excellent",
            SprintHealth::Good => "Good",
            SprintHealth::Fair => "Fair",
            SprintHealth::Poor => "Poor",
            SprintHealth::AtRisk => "At Risk",
        }
    }
}

impl fmt::Display for SprintHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub not_started_tasks: usize,
    pub overdue_tasks: usize,
    pub total_estimated_hours: u64,
    pub total_actual_hours: f64,
    pub completion_percentage: f64,
    pub health: SprintHealth,
}

pub fn summarize<'a>(
    sprint: impl IntoIterator<Item = &'a Task>,
    today: NaiveDate,
) -> SprintSummary {
    let mut total_tasks = 0;
    let mut completed_tasks = 0;
    let mut in_progress_tasks = 0;
    let mut not_started_tasks = 0;
    let mut overdue_tasks = 0;
    let mut total_estimated_hours = 0u64;
    let mut total_actual_hours = 0.0;

    for task in sprint.into_iter().filter(|t| t.in_sprint) {
        total_tasks += 1;
        match task.status {
            TaskStatus::Completed => completed_tasks += 1,
            TaskStatus::InProgress => in_progress_tasks += 1,
            TaskStatus::NotStarted => not_started_tasks += 1,
            TaskStatus::OnHold | TaskStatus::Cancelled => {}
        }
        if task.is_overdue(today) {
            overdue_tasks += 1;
        }
        total_estimated_hours += u64::from(task.estimated_hours);
        total_actual_hours += task.actual_hours;
    }

    let completion_percentage = if total_tasks == 0 {
        0.0
    } else {
        completed_tasks as f64 / total_tasks as f64 * 100.0
    };

    SprintSummary {
        total_tasks,
        completed_tasks,
        in_progress_tasks,
        not_started_tasks,
        overdue_tasks,
        total_estimated_hours,
        total_actual_hours,
        completion_percentage,
        health: SprintHealth::classify(completion_percentage, overdue_tasks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn sprint_task(id: u64, status: TaskStatus) -> Task {
        Task::new(id, "t", 8).with_status(status).in_sprint_at(id as i32)
    }

    #[test]
    fn eight_of_ten_completed_is_good() {
        let mut tasks: Vec<Task> = (1..=8).map(|i| sprint_task(i, TaskStatus::Completed)).collect();
        tasks.push(sprint_task(9, TaskStatus::InProgress));
        tasks.push(sprint_task(10, TaskStatus::NotStarted));

        let s = summarize(&tasks, today());
        assert_eq!(s.total_tasks, 10);
        assert_eq!(s.completed_tasks, 8);
        assert_eq!(s.in_progress_tasks, 1);
        assert_eq!(s.not_started_tasks, 1);
        assert_eq!(s.completion_percentage, 80.0);
        assert_eq!(s.health, SprintHealth::Good);
        assert_eq!(s.total_estimated_hours, 80);
    }

    #[test]
    fn empty_sprint_is_zero_percent_and_poor() {
        let s = summarize(&[] as &[Task], today());
        assert_eq!(s.total_tasks, 0);
        assert_eq!(s.completion_percentage, 0.0);
        assert_eq!(s.health, SprintHealth::Poor);
    }

    #[test]
    fn overdue_forces_at_risk_even_when_nearly_done() {
        let mut tasks: Vec<Task> = (1..=19)
            .map(|i| sprint_task(i, TaskStatus::Completed))
            .collect();
        tasks.push(
            sprint_task(20, TaskStatus::InProgress).with_deadline(today() - Duration::days(1)),
        );
        let s = summarize(&tasks, today());
        assert_eq!(s.completion_percentage, 95.0);
        assert_eq!(s.overdue_tasks, 1);
        assert_eq!(s.health, SprintHealth::AtRisk);
        assert_eq!(s.health.to_string(), "At Risk");
    }

    #[test]
    fn backlog_is_not_counted() {
        let tasks = vec![sprint_task(1, TaskStatus::Completed), Task::new(2, "backlog", 8)];
        assert_eq!(summarize(&tasks, today()).total_tasks, 1);
    }

    #[test]
    fn health_boundaries() {
        assert_eq!(SprintHealth::classify(90.0, 0), SprintHealth::Excellent);
        assert_eq!(SprintHealth::classify(70.0, 0), SprintHealth::Good);
        assert_eq!(SprintHealth::classify(50.0, 0), SprintHealth::Fair);
        assert_eq!(SprintHealth::classify(49.9, 0), SprintHealth::Poor);
        assert_eq!(SprintHealth::classify(100.0, 3), SprintHealth::AtRisk);
    }
}

//! Task model for the sprint capacity engine.
//!
//! A task is one unit of production work. It lives in the backlog until the
//! sprint mutator commits it to the sprint.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::{MachineId, OperatorId};

pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::OnHold => "On Hold",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// Finished tasks are never pulled into a sprint by auto-assignment.
    pub fn is_finished(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Ordered so that `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

/// Core task type.
///
/// `sprint_order` and the planned window are only meaningful while
/// `in_sprint` is true; leaving the sprint clears all three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project: Option<String>,

    /// Whole hours, always positive.
    pub estimated_hours: u32,
    /// Reported progress.
    #[serde(default)]
    pub actual_hours: f64,

    pub priority: Priority,
    pub status: TaskStatus,

    #[serde(default)]
    pub machine_id: Option<MachineId>,
    #[serde(default)]
    pub operator_ids: Vec<OperatorId>,

    #[serde(default)]
    pub in_sprint: bool,
    #[serde(default)]
    pub sprint_order: Option<i32>,
    #[serde(default)]
    pub planned_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub planned_end_date: Option<NaiveDate>,

    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    pub created_at_utc: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, estimated_hours: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: None,
            project: None,
            estimated_hours,
            actual_hours: 0.0,
            priority: Priority::Medium,
            status: TaskStatus::NotStarted,
            machine_id: None,
            operator_ids: Vec::new(),
            in_sprint: false,
            sprint_order: None,
            planned_start_date: None,
            planned_end_date: None,
            start_date: now.date_naive(),
            end_date: None,
            deadline: None,
            created_at_utc: now,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_machine(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    pub fn with_operators(mut self, operator_ids: Vec<OperatorId>) -> Self {
        self.operator_ids = operator_ids;
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_created_at(mut self, created_at_utc: DateTime<Utc>) -> Self {
        self.created_at_utc = created_at_utc;
        self
    }

    pub fn with_planned_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.planned_start_date = Some(start);
        self.planned_end_date = Some(end);
        self
    }

    /// Mark as committed to the sprint at `order`. Planned dates are left to the caller.
    pub fn in_sprint_at(mut self, order: i32) -> Self {
        self.in_sprint = true;
        self.sprint_order = Some(order);
        self
    }

    pub fn requires_machine(&self) -> bool {
        self.machine_id.is_some()
    }

    /// Drop every sprint-only field.
    pub fn leave_sprint(&mut self) {
        self.in_sprint = false;
        self.sprint_order = None;
        self.planned_start_date = None;
        self.planned_end_date = None;
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed && self.deadline.is_some_and(|d| d < today)
    }

    /// Inclusive planned-window membership; false when either bound is unset.
    pub fn planned_on(&self, day: NaiveDate) -> bool {
        match (self.planned_start_date, self.planned_end_date) {
            (Some(start), Some(end)) => start <= day && day <= end,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn leave_sprint_clears_sprint_fields() {
        let mut t = Task::new(1, "weld frame", 12)
            .in_sprint_at(3)
            .with_planned_window(d(2026, 3, 2), d(2026, 3, 3));
        t.leave_sprint();
        assert!(!t.in_sprint);
        assert_eq!(t.sprint_order, None);
        assert_eq!(t.planned_start_date, None);
        assert_eq!(t.planned_end_date, None);
    }

    #[test]
    fn completed_task_is_never_overdue() {
        let today = d(2026, 3, 10);
        let late = Task::new(1, "paint", 4).with_deadline(d(2026, 3, 1));
        assert!(late.is_overdue(today));
        let done = late.clone().with_status(TaskStatus::Completed);
        assert!(!done.is_overdue(today));
        let due_today = Task::new(2, "pack", 4).with_deadline(today);
        assert!(!due_today.is_overdue(today));
    }

    #[test]
    fn priority_orders_critical_highest() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn planned_on_is_inclusive() {
        let t = Task::new(1, "cut", 16).with_planned_window(d(2026, 3, 2), d(2026, 3, 3));
        assert!(t.planned_on(d(2026, 3, 2)));
        assert!(t.planned_on(d(2026, 3, 3)));
        assert!(!t.planned_on(d(2026, 3, 4)));
        assert!(!Task::new(2, "unplanned", 8).planned_on(d(2026, 3, 2)));
    }

    #[test]
    fn serde_uses_snake_case_enums() {
        let t = Task::new(7, "drill", 5).with_priority(Priority::High);
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"priority\":\"high\""));
        assert!(json.contains("\"status\":\"not_started\""));
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}

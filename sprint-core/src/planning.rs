//! The sprint planning view: everything a planning screen shows in one
//! read, with backlog filtering and paging.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::capacity::CapacitySnapshot;
use crate::resource::{Machine, MachineId, Operator, OperatorId};
use crate::summary::SprintSummary;
use crate::task::{Priority, Task, TaskStatus};
use crate::timeline::TimelineDay;

pub const MAX_PAGE_SIZE: usize = 100;

/// Backlog filters. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Case-insensitive substring of name, description or project.
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Case-insensitive project name.
    pub project: Option<String>,
    pub operator_id: Option<OperatorId>,
    pub machine_id: Option<MachineId>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let hit = [
                Some(task.name.as_str()),
                task.description.as_deref(),
                task.project.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if let Some(project) = &self.project {
            let same = task
                .project
                .as_deref()
                .is_some_and(|p| p.eq_ignore_ascii_case(project.trim()));
            if !same {
                return false;
            }
        }
        if self.operator_id.is_some_and(|id| !task.operator_ids.contains(&id)) {
            return false;
        }
        if self.machine_id.is_some_and(|id| task.machine_id != Some(id)) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningQuery {
    pub filter: TaskFilter,
    /// 1-based; 0 is treated as 1.
    pub page: usize,
    /// Falls back to the engine's configured page size.
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice `items` into the requested page. Out-of-range pages come back empty.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();
    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Resource lists for filter pickers and assignment screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceView {
    pub operators: Vec<Operator>,
    pub machines: Vec<Machine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningData {
    pub today: NaiveDate,
    /// Sorted by sprint order, then id.
    pub sprint_tasks: Vec<Task>,
    /// Filtered backlog in candidate order.
    pub backlog: Page<Task>,
    pub capacity: CapacitySnapshot,
    pub resources: ResourceView,
    pub summary: SprintSummary,
    pub timeline: Vec<TimelineDay>,
}

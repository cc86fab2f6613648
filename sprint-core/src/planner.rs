//! Auto-assignment planner: greedy, priority-ordered fill of the sprint
//! from the backlog.
//!
//! Candidate ranking:
//! - priority DESC
//! - deadline ASC (no deadline sorts last)
//! - created_at ASC, then id ASC for stability
//!
//! A candidate that does not fit is skipped; the loop keeps going, so a
//! smaller task further down the list can still use leftover capacity.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::capacity;
use crate::schedule::planned_window;
use crate::store::SprintSnapshot;
use crate::task::{Task, TaskId};
use crate::validator::validate_against;

/// Outcome of one planning pass, before it is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPlan {
    pub assigned: Vec<TaskId>,
    pub skipped: Vec<(TaskId, String)>,
}

pub fn candidate_order(a: &Task, b: &Task) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at_utc.cmp(&b.created_at_utc))
        .then_with(|| a.id.cmp(&b.id))
}

/// Backlog tasks eligible for assignment, best first.
pub fn backlog_candidates(snapshot: &SprintSnapshot) -> Vec<TaskId> {
    let mut backlog: Vec<&Task> = snapshot
        .backlog_tasks()
        .filter(|t| !t.status.is_finished())
        .collect();
    backlog.sort_by(|a, b| candidate_order(a, b));
    backlog.into_iter().map(|t| t.id).collect()
}

/// Run the greedy fill against `snapshot`, mutating it in place.
///
/// Each accepted task is validated against the capacity left after the
/// tasks accepted before it, gets the next sprint order, and is queued
/// behind them on the calendar.
pub fn plan_auto_assignment(
    snapshot: &mut SprintSnapshot,
    max_tasks: i32,
    today: NaiveDate,
    hours_per_day: u32,
) -> AssignmentPlan {
    let mut plan = AssignmentPlan::default();
    let Ok(limit) = usize::try_from(max_tasks) else {
        return plan;
    };
    if limit == 0 {
        return plan;
    }

    let mut cap = capacity::aggregate(snapshot);
    let mut next_order = snapshot.max_sprint_order().unwrap_or(0) + 1;

    for id in backlog_candidates(snapshot) {
        if plan.assigned.len() >= limit {
            break;
        }
        let Some(candidate) = snapshot.task(id) else { continue };

        let verdict = validate_against(&cap, candidate);
        if !verdict.can_add {
            plan.skipped.push((id, verdict.reason));
            continue;
        }

        let (start, end) = planned_window(candidate, &snapshot.tasks, today, hours_per_day);
        cap.include(candidate);

        if let Some(task) = snapshot.task_mut(id) {
            task.in_sprint = true;
            task.sprint_order = Some(next_order);
            task.planned_start_date = Some(start);
            task.planned_end_date = Some(end);
        }
        next_order += 1;
        plan.assigned.push(id);
    }

    plan
}

//! Assignment validation: may a candidate enter the sprint without
//! exceeding operator or machine capacity?

use serde::{Deserialize, Serialize};

use crate::capacity::CapacitySnapshot;
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Fits,
    NotFound,
    AlreadyInSprint,
    OperatorCapacityExceeded,
    MachineCapacityExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub can_add: bool,
    pub verdict: Verdict,
    pub reason: String,
}

impl Validation {
    fn accept(reason: String) -> Self {
        Self {
            can_add: true,
            verdict: Verdict::Fits,
            reason,
        }
    }

    fn reject(verdict: Verdict, reason: String) -> Self {
        Self {
            can_add: false,
            verdict,
            reason,
        }
    }

    pub fn not_found(id: TaskId) -> Self {
        Self::reject(Verdict::NotFound, format!("task {id} not found"))
    }
}

/// Check `task` against the capacity as it stands in `cap`.
///
/// Pure: the same inputs always give the same answer.
pub fn validate_against(cap: &CapacitySnapshot, task: &Task) -> Validation {
    if task.in_sprint {
        return Validation::reject(
            Verdict::AlreadyInSprint,
            format!("task {} is already in the sprint", task.id),
        );
    }

    let hours = u64::from(task.estimated_hours);
    let operator_after = cap.required_operator_hours + hours;
    if operator_after > cap.total_operator_hours {
        return Validation::reject(
            Verdict::OperatorCapacityExceeded,
            format!(
                "operator capacity exceeded: {operator_after}h required, {}h available",
                cap.total_operator_hours
            ),
        );
    }

    if task.requires_machine() {
        let machine_after = cap.required_machine_hours + hours;
        if machine_after > cap.total_machine_hours {
            return Validation::reject(
                Verdict::MachineCapacityExceeded,
                format!(
                    "machine capacity exceeded: {machine_after}h required, {}h available",
                    cap.total_machine_hours
                ),
            );
        }
    }

    Validation::accept(format!(
        "task {} fits: {}h of {}h operator capacity would be used",
        task.id, operator_after, cap.total_operator_hours
    ))
}

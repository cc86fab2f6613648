//! Capacity aggregation: available vs. required hours for the current sprint.

use serde::{Deserialize, Serialize};

use crate::resource::CapacityResource;
use crate::store::SprintSnapshot;
use crate::task::Task;

/// Per-resource breakdown row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLoad {
    pub id: u64,
    pub name: String,
    pub is_active: bool,
    pub capacity_hours: u32,
    pub assigned_hours: u64,
    pub assigned_tasks: usize,
}

impl ResourceLoad {
    pub fn utilization_percent(&self) -> f64 {
        percent(self.assigned_hours, u64::from(self.capacity_hours))
    }

    pub fn is_overbooked(&self) -> bool {
        self.assigned_hours > u64::from(self.capacity_hours)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    pub total_operator_hours: u64,
    pub total_machine_hours: u64,
    pub required_operator_hours: u64,
    pub required_machine_hours: u64,
    pub available_operators: usize,
    pub available_machines: usize,
    pub operator_loads: Vec<ResourceLoad>,
    pub machine_loads: Vec<ResourceLoad>,
}

impl CapacitySnapshot {
    pub fn can_complete_all_tasks(&self) -> bool {
        self.required_operator_hours <= self.total_operator_hours
            && self.required_machine_hours <= self.total_machine_hours
    }

    pub fn operator_utilization(&self) -> f64 {
        percent(self.required_operator_hours, self.total_operator_hours)
    }

    pub fn machine_utilization(&self) -> f64 {
        percent(self.required_machine_hours, self.total_machine_hours)
    }

    pub fn remaining_operator_hours(&self) -> u64 {
        self.total_operator_hours
            .saturating_sub(self.required_operator_hours)
    }

    pub fn remaining_machine_hours(&self) -> u64 {
        self.total_machine_hours
            .saturating_sub(self.required_machine_hours)
    }

    /// Account for `task` entering the sprint. Totals are untouched.
    pub fn include(&mut self, task: &Task) {
        let hours = u64::from(task.estimated_hours);
        self.required_operator_hours += hours;
        if let Some(machine_id) = task.machine_id {
            self.required_machine_hours += hours;
            if let Some(load) = self.machine_loads.iter_mut().find(|l| l.id == machine_id) {
                load.assigned_hours += hours;
                load.assigned_tasks += 1;
            }
        }
        for load in self
            .operator_loads
            .iter_mut()
            .filter(|l| task.operator_ids.contains(&l.id))
        {
            load.assigned_hours += hours;
            load.assigned_tasks += 1;
        }
    }
}

/// Build the capacity view from a snapshot. Totals count active resources
/// only; the breakdown lists every resource so inactive ones stay visible.
pub fn aggregate(snapshot: &SprintSnapshot) -> CapacitySnapshot {
    let mut cap = CapacitySnapshot {
        total_operator_hours: active_hours(&snapshot.operators),
        total_machine_hours: active_hours(&snapshot.machines),
        available_operators: snapshot.operators.iter().filter(|o| o.is_active).count(),
        available_machines: snapshot.machines.iter().filter(|m| m.is_active).count(),
        operator_loads: snapshot.operators.iter().map(empty_load).collect(),
        machine_loads: snapshot.machines.iter().map(empty_load).collect(),
        ..CapacitySnapshot::default()
    };

    for task in snapshot.sprint_tasks() {
        cap.include(task);
    }
    cap
}

fn active_hours<R: CapacityResource>(resources: &[R]) -> u64 {
    resources
        .iter()
        .filter(|r| r.is_active())
        .map(|r| u64::from(r.weekly_capacity_hours()))
        .sum()
}

fn empty_load<R: CapacityResource>(r: &R) -> ResourceLoad {
    ResourceLoad {
        id: r.resource_id(),
        name: r.display_name().to_string(),
        is_active: r.is_active(),
        capacity_hours: r.weekly_capacity_hours(),
        assigned_hours: 0,
        assigned_tasks: 0,
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Machine, Operator};

    fn snapshot(tasks: Vec<Task>) -> SprintSnapshot {
        SprintSnapshot {
            revision: 0,
            tasks,
            operators: vec![
                Operator::new(1, "Ana", 40),
                Operator::new(2, "Ben", 40),
                Operator::new(3, "Cy", 40).inactive(),
            ],
            machines: vec![Machine::new(10, "Lathe", 60), Machine::new(11, "Mill", 60).inactive()],
        }
    }

    #[test]
    fn totals_count_active_resources_only() {
        let cap = aggregate(&snapshot(vec![]));
        assert_eq!(cap.total_operator_hours, 80);
        assert_eq!(cap.total_machine_hours, 60);
        assert_eq!(cap.available_operators, 2);
        assert_eq!(cap.available_machines, 1);
        assert_eq!(cap.operator_loads.len(), 3);
        assert!(cap.can_complete_all_tasks());
    }

    #[test]
    fn required_hours_come_from_sprint_tasks_only() {
        let cap = aggregate(&snapshot(vec![
            Task::new(1, "in sprint, machine", 10).with_machine(10).in_sprint_at(1),
            Task::new(2, "in sprint, manual", 20)
                .with_operators(vec![1, 2])
                .in_sprint_at(2),
            Task::new(3, "backlog", 500).with_machine(10),
        ]));
        assert_eq!(cap.required_operator_hours, 30);
        assert_eq!(cap.required_machine_hours, 10);
        assert_eq!(cap.remaining_operator_hours(), 50);

        let lathe = cap.machine_loads.iter().find(|l| l.id == 10).unwrap();
        assert_eq!(lathe.assigned_hours, 10);
        let ana = cap.operator_loads.iter().find(|l| l.id == 1).unwrap();
        assert_eq!(ana.assigned_hours, 20);
        assert_eq!(ana.assigned_tasks, 1);
        assert!((ana.utilization_percent() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn over_commitment_flips_can_complete() {
        let cap = aggregate(&snapshot(vec![
            Task::new(1, "big", 70).with_machine(10).in_sprint_at(1),
        ]));
        assert_eq!(cap.required_machine_hours, 70);
        assert!(!cap.can_complete_all_tasks());
        assert_eq!(cap.remaining_machine_hours(), 0);
    }

    #[test]
    fn utilization_is_zero_without_capacity() {
        let cap = CapacitySnapshot::default();
        assert_eq!(cap.operator_utilization(), 0.0);
        assert_eq!(cap.machine_utilization(), 0.0);
    }
}

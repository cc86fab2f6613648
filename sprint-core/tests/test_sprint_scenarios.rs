use chrono::{Duration, NaiveDate};
use sprint_core::{
    DayStatus, EngineConfig, FixedClock, InMemoryStore, Machine, Operator, PlanningQuery, Priority,
    SprintEngine, SprintHealth, SprintStore, Task, TaskFilter, TaskStatus,
};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn two_operator_engine(tasks: Vec<Task>) -> SprintEngine<InMemoryStore, FixedClock> {
    let store = InMemoryStore::with_data(
        tasks,
        vec![Operator::new(1, "Ana Ruiz", 40), Operator::new(2, "Ben Okafor", 40)],
        vec![Machine::new(1, "CNC-1", 40)],
    );
    SprintEngine::new(store, FixedClock(monday()), EngineConfig::default())
}

/// Validate, add, over-validate, remove.
#[test]
fn capacity_follows_add_and_remove() {
    let e = two_operator_engine(vec![Task::new(1, "frame", 30), Task::new(2, "housing", 60)]);
    assert_eq!(e.get_sprint_capacity().unwrap().total_operator_hours, 80);

    assert!(e.validate_task_for_sprint(1).unwrap().can_add);
    assert!(e.add_task_to_sprint(1, 1).unwrap());
    assert_eq!(e.get_sprint_capacity().unwrap().required_operator_hours, 30);

    let second = e.validate_task_for_sprint(2).unwrap();
    assert!(!second.can_add);
    assert!(second.reason.contains("capacity exceeded"));

    assert!(e.remove_task_from_sprint(1).unwrap());
    assert_eq!(e.get_sprint_capacity().unwrap().required_operator_hours, 0);
    assert!(!e.remove_task_from_sprint(1).unwrap());
}

/// High priority fits, the huge low-priority task is skipped.
#[test]
fn auto_assign_takes_what_fits() {
    let e = two_operator_engine(vec![
        Task::new(1, "A", 10).with_priority(Priority::High),
        Task::new(2, "B", 500).with_priority(Priority::Low),
    ]);
    let assigned = e.auto_assign_tasks_to_sprint(10).unwrap();
    assert_eq!(assigned, 1);
    let summary = e.get_sprint_summary().unwrap();
    assert_eq!(summary.total_tasks, 1);
}

/// Auto-assignment never pushes required hours past capacity.
#[test]
fn auto_assign_stays_within_capacity() {
    let tasks: Vec<Task> = (1..=20)
        .map(|i| {
            let t = Task::new(i, format!("job {i}"), (i as u32 % 7) * 3 + 2);
            if i % 3 == 0 { t.with_machine(1) } else { t }
        })
        .collect();
    let backlog = tasks.len();
    let e = two_operator_engine(tasks);

    let assigned = e.auto_assign_tasks_to_sprint(15).unwrap();
    assert!(assigned <= 15 && assigned <= backlog);
    let cap = e.get_sprint_capacity().unwrap();
    assert!(cap.can_complete_all_tasks());

    let snap = e.store().snapshot().unwrap();
    let mut orders: Vec<i32> = snap.sprint_tasks().filter_map(|t| t.sprint_order).collect();
    orders.sort_unstable();
    assert_eq!(orders, (1..=assigned as i32).collect::<Vec<_>>());
}

/// Three tasks on one weekday totalling 10h.
#[test]
fn timeline_flags_overloaded_day() {
    let wed = monday() + Duration::days(2);
    let planned = |id: u64, hours: u32| {
        Task::new(id, format!("t{id}"), hours)
            .in_sprint_at(id as i32)
            .with_planned_window(wed, wed)
    };
    let e = two_operator_engine(vec![planned(1, 2), planned(2, 4), planned(3, 4)]);

    let tl = e.get_sprint_timeline(wed, wed).unwrap();
    assert_eq!(tl.len(), 1);
    assert!(tl[0].is_overloaded);
    assert_eq!(tl[0].status, DayStatus::Overloaded);

    let week = e.get_sprint_timeline(monday(), monday() + Duration::days(6)).unwrap();
    assert_eq!(week.len(), 7);
    assert!(week[5].is_weekend && week[6].is_weekend);
}

/// 8 of 10 completed, nothing overdue.
#[test]
fn summary_grades_good_sprint() {
    let tasks: Vec<Task> = (1..=10)
        .map(|i| {
            let status = if i <= 8 { TaskStatus::Completed } else { TaskStatus::InProgress };
            Task::new(i, "t", 4).with_status(status).in_sprint_at(i as i32)
        })
        .collect();
    let e = two_operator_engine(tasks);
    let s = e.get_sprint_summary().unwrap();
    assert_eq!(s.completion_percentage, 80.0);
    assert_eq!(s.health, SprintHealth::Good);
}

#[test]
fn overdue_task_means_at_risk() {
    let e = two_operator_engine(vec![
        Task::new(1, "done", 4).with_status(TaskStatus::Completed).in_sprint_at(1),
        Task::new(2, "late", 4)
            .with_deadline(monday() - Duration::days(1))
            .in_sprint_at(2),
    ]);
    assert_eq!(e.get_sprint_summary().unwrap().health, SprintHealth::AtRisk);
}

#[test]
fn planning_view_filters_and_pages_backlog() {
    let mut tasks: Vec<Task> = (1..=30)
        .map(|i| {
            let t = Task::new(i, format!("part {i}"), 2);
            if i % 2 == 0 { t.with_project("Gearbox") } else { t.with_project("Axle") }
        })
        .collect();
    tasks.push(Task::new(31, "in sprint", 4).in_sprint_at(1));
    let e = two_operator_engine(tasks);

    let query = PlanningQuery {
        filter: TaskFilter {
            project: Some("gearbox".into()),
            ..TaskFilter::default()
        },
        page: 2,
        page_size: Some(10),
    };
    let data = e.get_sprint_planning_data(&query).unwrap();
    assert_eq!(data.today, monday());
    assert_eq!(data.backlog.total_items, 15);
    assert_eq!(data.backlog.total_pages, 2);
    assert_eq!(data.backlog.items.len(), 5);
    assert_eq!(data.sprint_tasks.len(), 1);
    assert_eq!(data.timeline.len(), 14);
    assert_eq!(data.resources.operators.len(), 2);
    assert_eq!(data.capacity.required_operator_hours, 4);
    assert_eq!(data.summary.total_tasks, 1);
}

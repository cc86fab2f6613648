//! Terminal output for the read commands. `--json` swaps every view for
//! the pretty-printed serde form.

use anyhow::Result;
use serde::Serialize;
use sprint_core::{
    CapacitySnapshot, Page, PlanningData, ResourceLoad, SprintSummary, Task, TimelineDay,
    Validation,
};

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }

    pub fn planning(&self, data: &PlanningData) -> Result<()> {
        self.emit(data, |d| {
            println!("# Sprint plan ({})\n", d.today);
            println!("## Sprint ({} tasks)\n", d.sprint_tasks.len());
            if d.sprint_tasks.is_empty() {
                println!("(empty)");
            }
            for t in &d.sprint_tasks {
                print_task(t);
            }
            println!();
            print_capacity(&d.capacity);
            println!();
            print_summary(&d.summary);
            println!();
            print_backlog(&d.backlog);
            println!();
            print_timeline(&d.timeline);
        })
    }

    pub fn capacity(&self, cap: &CapacitySnapshot) -> Result<()> {
        self.emit(cap, print_capacity)
    }

    pub fn summary(&self, summary: &SprintSummary) -> Result<()> {
        self.emit(summary, print_summary)
    }

    pub fn timeline(&self, days: &[TimelineDay]) -> Result<()> {
        self.emit(days, print_timeline)
    }

    pub fn validation(&self, v: &Validation) -> Result<()> {
        self.emit(v, |v| {
            let mark = if v.can_add { "ok" } else { "rejected" };
            println!("[{mark}] {:?}: {}", v.verdict, v.reason);
        })
    }
}

fn print_task(t: &Task) {
    let order = t
        .sprint_order
        .map(|o| format!("#{o:<3}"))
        .unwrap_or_else(|| "    ".to_string());
    let window = match (t.planned_start_date, t.planned_end_date) {
        (Some(s), Some(e)) => format!("{s}..{e}"),
        _ => "unplanned".to_string(),
    };
    let machine = t
        .machine_id
        .map(|m| format!(" machine={m}"))
        .unwrap_or_default();
    println!(
        "{order} {:>5} | {:<8} | {:<11} | {:>3}h | {window}{machine} | {}",
        t.id,
        t.priority.label(),
        t.status.label(),
        t.estimated_hours,
        t.name
    );
}

fn print_loads(kind: &str, loads: &[ResourceLoad]) {
    for l in loads {
        let flag = match (l.is_active, l.is_overbooked()) {
            (false, _) => " (inactive)",
            (true, true) => " OVERBOOKED",
            (true, false) => "",
        };
        println!(
            "  {kind} {:>4} {:<20} {:>4}/{:<4}h {:>5.1}% ({} tasks){flag}",
            l.id,
            l.name,
            l.assigned_hours,
            l.capacity_hours,
            l.utilization_percent(),
            l.assigned_tasks
        );
    }
}

fn print_capacity(cap: &CapacitySnapshot) {
    println!("## Capacity\n");
    println!(
        "Operators: {}/{}h ({:.1}%), {} active, {}h left",
        cap.required_operator_hours,
        cap.total_operator_hours,
        cap.operator_utilization(),
        cap.available_operators,
        cap.remaining_operator_hours()
    );
    println!(
        "Machines:  {}/{}h ({:.1}%), {} active, {}h left",
        cap.required_machine_hours,
        cap.total_machine_hours,
        cap.machine_utilization(),
        cap.available_machines,
        cap.remaining_machine_hours()
    );
    print_loads("operator", &cap.operator_loads);
    print_loads("machine ", &cap.machine_loads);
    if !cap.can_complete_all_tasks() {
        println!("Sprint needs more hours than the team has.");
    }
}

fn print_summary(s: &SprintSummary) {
    println!("## Summary\n");
    println!(
        "{} tasks: {} done, {} in progress, {} not started, {} overdue",
        s.total_tasks, s.completed_tasks, s.in_progress_tasks, s.not_started_tasks, s.overdue_tasks
    );
    println!(
        "Hours: {} estimated, {:.1} actual | {:.1}% complete | health: {}",
        s.total_estimated_hours, s.total_actual_hours, s.completion_percentage, s.health
    );
}

fn print_backlog(page: &Page<Task>) {
    println!(
        "## Backlog (page {}/{}, {} matching)\n",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
    for t in &page.items {
        print_task(t);
    }
}

fn print_timeline(days: &[TimelineDay]) {
    println!("## Timeline\n");
    for d in days {
        let names: Vec<&str> = d
            .tasks_in_progress
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        println!(
            "{} {} {:>5.1}h {:<10} {}",
            d.date,
            d.date.format("%a"),
            d.total_hours_scheduled,
            d.status.label(),
            names.join(", ")
        );
    }
}

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sprint_core::schedule::add_days;
use sprint_core::{
    CapacityEvent, PlanningQuery, Priority, SprintEngine, SystemClock, TaskFilter, TaskId,
    TaskStatus,
};
use sprint_ingest::parsers::Labels;
use sprint_ingest::{Parsed, parse_machines_csv, parse_operators_csv, parse_tasks_csv};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

mod config;
mod render;
mod state;

use render::Output;
use state::{FileStore, ImportCounts};

type Engine = SprintEngine<FileStore, SystemClock>;

#[derive(Parser, Debug)]
#[command(
    name = "sprint",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SPRINT_BUILD_SHA"), ")"),
    about = "Sprint capacity planning and auto-assignment"
)]
struct Cli {
    /// Config file (default: ~/.sprint/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file; overrides [storage] path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Print read views as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sprint, capacity, summary, filtered backlog and timeline in one view
    Plan(PlanArgs),

    /// Add a backlog task to the sprint (capacity checked unless --force)
    Add {
        id: TaskId,

        /// Sprint order (default: after the last sprint task)
        #[arg(long)]
        order: Option<i32>,

        /// Skip the capacity check
        #[arg(long)]
        force: bool,
    },

    /// Move a task back to the backlog
    Remove { id: TaskId },

    /// Set sprint orders, e.g. `sprint reorder 12=1 7=2`
    Reorder {
        #[arg(required = true, value_parser = parse_order)]
        orders: Vec<(TaskId, i32)>,
    },

    /// Change a task's estimated hours
    Estimate {
        id: TaskId,
        #[arg(allow_negative_numbers = true)]
        hours: i64,
    },

    /// Overwrite a task's planned window; omitted dates are cleared
    Dates {
        id: TaskId,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Operator and machine hours: available vs. required
    Capacity,

    /// Completion and health of the current sprint
    Summary,

    /// Move every sprint task back to the backlog
    Clear,

    /// Fill the sprint from the backlog by priority, deadline and age
    AutoAssign {
        /// Most tasks to add (default: [engine] default_auto_assign_limit)
        #[arg(long)]
        max: Option<i32>,
    },

    /// Per-day workload (default window: today + [engine] timeline_days)
    Timeline {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Check whether a task would fit in the sprint
    Validate { id: TaskId },

    /// Seed the store from CSV files
    Import {
        #[arg(long)]
        tasks: Option<PathBuf>,
        #[arg(long)]
        operators: Option<PathBuf>,
        #[arg(long)]
        machines: Option<PathBuf>,
    },

    /// Config file management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Substring of name, description or project
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_parser = parse_status)]
    status: Option<TaskStatus>,
    #[arg(long, value_parser = parse_priority)]
    priority: Option<Priority>,
    #[arg(long)]
    project: Option<String>,
    #[arg(long)]
    operator: Option<u64>,
    #[arg(long)]
    machine: Option<u64>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    page_size: Option<usize>,
}

impl PlanArgs {
    fn query(self) -> PlanningQuery {
        PlanningQuery {
            filter: TaskFilter {
                search: self.search,
                status: self.status,
                priority: self.priority,
                project: self.project,
                operator_id: self.operator,
                machine_id: self.machine,
            },
            page: self.page,
            page_size: self.page_size,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Command::Config {
        command: ConfigCommand::Init,
    } = &cli.command
    {
        config::init_config(cli.config.as_deref())?;
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = config::load_config(cli.config.as_deref())?;
    init_tracing(&cfg.logging.level);

    let store_path = cfg.store_path(cli.store.as_deref())?;
    let clock = SystemClock::from_timezone_name(&cfg.engine.timezone)
        .context("[engine] timezone")?;
    info!(store = %store_path.display(), "opening sprint store");

    let engine = SprintEngine::new(FileStore::open(store_path), clock, cfg.engine)
        .with_listener(|event: &CapacityEvent| {
            info!(
                change = ?event.change,
                tasks = ?event.task_ids,
                revision = event.revision,
                "capacity changed"
            );
        });

    run(&engine, cli.command, Output { json: cli.json })
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("logging disabled: {e}");
    }
}

fn run(engine: &Engine, command: Command, out: Output) -> Result<ExitCode> {
    match command {
        Command::Plan(args) => {
            let data = engine.get_sprint_planning_data(&args.query())?;
            out.planning(&data)?;
        }

        Command::Add { id, order, force } => {
            let order = match order {
                Some(o) => o,
                None => engine.next_sprint_order()?,
            };
            if force {
                if !engine.add_task_to_sprint(id, order)? {
                    return rejected(format!("task {id} not found"));
                }
                println!("Added task {id} at order {order} (capacity not checked)");
            } else {
                let v = engine.try_add_task_to_sprint(id, order)?;
                if !v.can_add {
                    return rejected(v.reason);
                }
                println!("Added task {id} at order {order}: {}", v.reason);
            }
        }

        Command::Remove { id } => {
            if !engine.remove_task_from_sprint(id)? {
                return rejected(format!("task {id} is not in the sprint"));
            }
            println!("Removed task {id} from the sprint");
        }

        Command::Reorder { orders } => {
            let orders: BTreeMap<TaskId, i32> = orders.into_iter().collect();
            let applied = engine.reorder_sprint_tasks(&orders)?;
            let skipped = orders.len() - applied;
            println!("Reordered {applied} sprint task(s), skipped {skipped} other id(s)");
        }

        Command::Estimate { id, hours } => {
            if !engine.update_task_estimated_time(id, hours)? {
                return rejected(format!(
                    "could not set task {id} to {hours}h (unknown task or hours not positive)"
                ));
            }
            println!("Task {id} estimated at {hours}h");
        }

        Command::Dates { id, start, end } => {
            if !engine.update_task_planned_dates(id, start, end)? {
                return rejected(format!(
                    "could not update task {id} (unknown task or start after end)"
                ));
            }
            println!("Task {id} planned {}..{}", show_date(start), show_date(end));
        }

        Command::Capacity => out.capacity(&engine.get_sprint_capacity()?)?,

        Command::Summary => out.summary(&engine.get_sprint_summary()?)?,

        Command::Clear => {
            engine.clear_sprint()?;
            println!("Sprint cleared");
        }

        Command::AutoAssign { max } => {
            let max = max.unwrap_or(engine.config().default_auto_assign_limit);
            let n = engine.auto_assign_tasks_to_sprint(max)?;
            println!("Auto-assigned {n} task(s)");
        }

        Command::Timeline { start, end } => {
            let days = engine.config().timeline_window_days();
            let (start, end) = timeline_window(engine.today(), start, end, days);
            out.timeline(&engine.get_sprint_timeline(start, end)?)?;
        }

        Command::Validate { id } => {
            let v = engine.validate_task_for_sprint(id)?;
            out.validation(&v)?;
            if !v.can_add {
                return Ok(ExitCode::from(1));
            }
        }

        Command::Import {
            tasks,
            operators,
            machines,
        } => {
            if tasks.is_none() && operators.is_none() && machines.is_none() {
                return rejected("nothing to import (pass --tasks, --operators or --machines)");
            }
            let store = engine.store();
            if let Some(p) = operators {
                let parsed = parse_operators_csv(&p)?;
                report("operators", &p, &parsed, store.import_operators(parsed.records.clone())?);
            }
            if let Some(p) = machines {
                let parsed = parse_machines_csv(&p)?;
                report("machines", &p, &parsed, store.import_machines(parsed.records.clone())?);
            }
            if let Some(p) = tasks {
                let parsed = parse_tasks_csv(&p)?;
                report("tasks", &p, &parsed, store.import_tasks(parsed.records.clone())?);
            }
        }

        // handled in main before the store is opened
        Command::Config { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn rejected(reason: impl std::fmt::Display) -> Result<ExitCode> {
    eprintln!("{reason}");
    Ok(ExitCode::from(1))
}

fn report<T>(kind: &str, path: &std::path::Path, parsed: &Parsed<T>, counts: ImportCounts) {
    println!(
        "Imported {kind} from {}: {} new, {} updated, {} skipped",
        path.display(),
        counts.inserted,
        counts.updated,
        parsed.issues.len()
    );
    for issue in &parsed.issues {
        println!("  line {}: {}", issue.line, issue.message);
    }
}

/// Missing ends default to `days` long windows; never past the last calendar day.
fn timeline_window(
    today: NaiveDate,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    days: i64,
) -> (NaiveDate, NaiveDate) {
    let start = start.unwrap_or(today);
    let end = end.unwrap_or_else(|| add_days(start, days - 1));
    (start, end)
}

fn show_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn parse_order(s: &str) -> Result<(TaskId, i32), String> {
    let (id, order) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <id>=<order>, got '{s}'"))?;
    let id = id.trim().parse().map_err(|_| format!("bad task id '{id}'"))?;
    let order = order.trim().parse().map_err(|_| format!("bad order '{order}'"))?;
    Ok((id, order))
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    let labels = Labels::new().map_err(|e| e.to_string())?;
    labels.status(s).ok_or_else(|| format!("unknown status '{s}'"))
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    let labels = Labels::new().map_err(|e| e.to_string())?;
    labels.priority(s).ok_or_else(|| format!("unknown priority '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn reorder_pairs_parse() {
        assert_eq!(parse_order("12=3"), Ok((12, 3)));
        assert_eq!(parse_order(" 4 = -1 "), Ok((4, -1)));
        assert!(parse_order("12").is_err());
        assert!(parse_order("a=1").is_err());
    }

    #[test]
    fn plan_filters_reach_the_query() {
        let cli = Cli::try_parse_from([
            "sprint", "plan", "--status", "in progress", "--priority", "HIGH", "--project",
            "gearbox", "--page", "2",
        ])
        .unwrap();
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        let q = args.query();
        assert_eq!(q.filter.status, Some(TaskStatus::InProgress));
        assert_eq!(q.filter.priority, Some(Priority::High));
        assert_eq!(q.filter.project.as_deref(), Some("gearbox"));
        assert_eq!(q.page, 2);
        assert_eq!(q.page_size, None);
    }

    #[test]
    fn timeline_window_defaults_and_saturates() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(timeline_window(today, None, None, 14), (today, end));
        assert_eq!(
            timeline_window(today, Some(NaiveDate::MAX), None, 14),
            (NaiveDate::MAX, NaiveDate::MAX)
        );
    }

    #[test]
    fn negative_estimate_is_accepted_by_the_parser() {
        let cli = Cli::try_parse_from(["sprint", "estimate", "3", "-5"]).unwrap();
        assert!(matches!(cli.command, Command::Estimate { id: 3, hours: -5 }));
    }
}

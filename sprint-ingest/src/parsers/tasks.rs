//! Backlog task CSV.
//!
//! Expected header (column order is free, optional columns may be absent):
//!   id,name,estimated_hours,priority,status,machine_id,operator_ids,
//!   deadline,start_date,project,description,actual_hours
//!
//! `operator_ids` is `;`-separated; dates are `YYYY-MM-DD`.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sprint_core::{Priority, Task, TaskStatus};

use super::{line_of, Labels};
use crate::types::Parsed;

#[derive(Debug, Deserialize)]
struct TaskRow {
    id: u64,
    name: String,
    estimated_hours: i64,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    machine_id: Option<u64>,
    #[serde(default)]
    operator_ids: Option<String>,
    #[serde(default)]
    deadline: Option<NaiveDate>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    actual_hours: Option<f64>,
}

/// Parse a task CSV file. Imported tasks always land in the backlog.
pub fn parse_tasks_csv(path: impl AsRef<Path>) -> Result<Parsed<Task>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_tasks_reader(file)
}

pub fn parse_tasks_reader(reader: impl Read) -> Result<Parsed<Task>> {
    let labels = Labels::new()?;
    let today = Utc::now().date_naive();

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().context("reading task CSV header")?.clone();

    let mut out = Parsed::default();
    let mut seen = HashSet::new();

    for (i, result) in rdr.records().enumerate() {
        let fallback_line = i as u64 + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.skip(fallback_line, e.to_string());
                continue;
            }
        };
        let line = line_of(&record, fallback_line);

        let row: TaskRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                out.skip(line, e.to_string());
                continue;
            }
        };

        let task = match row_to_task(row, &labels, today) {
            Ok(task) => task,
            Err(msg) => {
                out.skip(line, msg);
                continue;
            }
        };
        // Only rows that made it count as taken ids.
        if !seen.insert(task.id) {
            out.skip(line, format!("duplicate task id {}", task.id));
            continue;
        }
        out.records.push(task);
    }

    if !out.is_clean() {
        tracing::warn!(skipped = out.issues.len(), "task CSV rows skipped");
    }
    Ok(out)
}

fn row_to_task(row: TaskRow, labels: &Labels, today: NaiveDate) -> Result<Task, String> {
    let name = row.name.trim();
    if name.is_empty() {
        return Err("name is empty".to_string());
    }

    let hours = u32::try_from(row.estimated_hours)
        .ok()
        .filter(|h| *h > 0)
        .ok_or_else(|| {
            format!(
                "estimated_hours must be a positive integer, got {}",
                row.estimated_hours
            )
        })?;

    let priority = match row.priority.as_deref() {
        Some(p) => labels.priority(p).ok_or_else(|| format!("unknown priority '{p}'"))?,
        None => Priority::Medium,
    };
    let status = match row.status.as_deref() {
        Some(s) => labels.status(s).ok_or_else(|| format!("unknown status '{s}'"))?,
        None => TaskStatus::NotStarted,
    };

    let operator_ids = match row.operator_ids.as_deref() {
        Some(ids) => ids
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<u64>().map_err(|_| format!("bad operator id '{s}'")))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let actual_hours = row.actual_hours.unwrap_or(0.0);
    if actual_hours < 0.0 {
        return Err("actual_hours must not be negative".to_string());
    }

    let mut task = Task::new(row.id, name, hours)
        .with_priority(priority)
        .with_status(status)
        .with_operators(operator_ids);
    task.machine_id = row.machine_id;
    task.deadline = row.deadline;
    task.start_date = row.start_date.unwrap_or(today);
    task.project = row.project.filter(|p| !p.is_empty());
    task.description = row.description.filter(|d| !d.is_empty());
    task.actual_hours = actual_hours;
    Ok(task)
}

//! Day-by-day projection of the sprint's planned workload.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::HourApportionment;
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayStatus {
    Weekend,
    Overloaded,
    Busy,
    Moderate,
    Light,
    Free,
}

impl DayStatus {
    pub fn label(self) -> &'static str {
        match self {
            DayStatus::Weekend => "Weekend",
            DayStatus::Overloaded => "Overloaded",
            DayStatus::Busy => "Busy",
            DayStatus::Moderate => "Moderate",
            DayStatus::Light => "Light",
            DayStatus::Free => "Free",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineTask {
    pub id: TaskId,
    pub name: String,
    /// Hours this task contributes to the day under the active apportionment.
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub tasks_starting: Vec<TimelineTask>,
    pub tasks_ending: Vec<TimelineTask>,
    pub tasks_in_progress: Vec<TimelineTask>,
    pub total_hours_scheduled: f64,
    pub is_overloaded: bool,
    pub is_weekend: bool,
    pub status: DayStatus,
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekend > Overloaded > Busy (>6h) > Moderate (>3h) > Light (>0h) > Free.
pub fn classify_day(is_weekend: bool, hours: f64, overload_threshold: f64) -> DayStatus {
    if is_weekend {
        DayStatus::Weekend
    } else if hours > overload_threshold {
        DayStatus::Overloaded
    } else if hours > 6.0 {
        DayStatus::Busy
    } else if hours > 3.0 {
        DayStatus::Moderate
    } else if hours > 0.0 {
        DayStatus::Light
    } else {
        DayStatus::Free
    }
}

/// Hours `task` puts on any single day of its planned window.
pub fn daily_hours(task: &Task, apportionment: HourApportionment) -> f64 {
    let hours = f64::from(task.estimated_hours);
    match apportionment {
        HourApportionment::FullSpan => hours,
        HourApportionment::EvenSplit => {
            let span = match (task.planned_start_date, task.planned_end_date) {
                (Some(start), Some(end)) if end >= start => (end - start).num_days() + 1,
                _ => 1,
            };
            hours / span as f64
        }
    }
}

/// One entry per calendar day in `start..=end`; empty when `start > end`.
pub fn build_timeline<'a>(
    sprint: impl IntoIterator<Item = &'a Task>,
    start: NaiveDate,
    end: NaiveDate,
    apportionment: HourApportionment,
    working_hours_per_day: u32,
) -> Vec<TimelineDay> {
    if start > end {
        return Vec::new();
    }
    let tasks: Vec<&Task> = sprint.into_iter().filter(|t| t.in_sprint).collect();
    let threshold = f64::from(working_hours_per_day);
    let days = (end - start).num_days() + 1;

    (0..days)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let entry = |t: &Task| TimelineTask {
                id: t.id,
                name: t.name.clone(),
                hours: daily_hours(t, apportionment),
            };

            let tasks_starting: Vec<TimelineTask> = tasks
                .iter()
                .filter(|t| t.planned_start_date == Some(date))
                .map(|&t| entry(t))
                .collect();
            let tasks_ending: Vec<TimelineTask> = tasks
                .iter()
                .filter(|t| t.planned_end_date == Some(date))
                .map(|&t| entry(t))
                .collect();
            let tasks_in_progress: Vec<TimelineTask> = tasks
                .iter()
                .filter(|t| t.planned_on(date))
                .map(|&t| entry(t))
                .collect();

            let total_hours_scheduled: f64 = tasks_in_progress.iter().map(|t| t.hours).sum();
            let weekend = is_weekend(date);

            TimelineDay {
                date,
                tasks_starting,
                tasks_ending,
                tasks_in_progress,
                total_hours_scheduled,
                is_overloaded: total_hours_scheduled > threshold,
                is_weekend: weekend,
                status: classify_day(weekend, total_hours_scheduled, threshold),
            }
        })
        .collect()
}

//! Planned-window calculation for tasks entering the sprint.
//!
//! Tasks are laid end to end: a new task starts on the later of today and
//! the day after the last planned end already in the sprint, and occupies
//! `ceil(estimated_hours / hours_per_day)` calendar days (at least one).

use chrono::{Duration, NaiveDate};

use crate::task::Task;

/// `date + days`, pinned to the calendar's last day instead of overflowing.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}

pub fn span_days(estimated_hours: u32, hours_per_day: u32) -> i64 {
    let per_day = hours_per_day.max(1);
    i64::from(estimated_hours.div_ceil(per_day).max(1))
}

/// Compute `(planned_start, planned_end)` for `task` given the rest of the sprint.
pub fn planned_window<'a>(
    task: &Task,
    sprint: impl IntoIterator<Item = &'a Task>,
    today: NaiveDate,
    hours_per_day: u32,
) -> (NaiveDate, NaiveDate) {
    let after_previous = sprint
        .into_iter()
        .filter(|t| t.in_sprint && t.id != task.id)
        .filter_map(|t| t.planned_end_date)
        .max()
        .map(|end| add_days(end, 1));

    let start = match after_previous {
        Some(next_free) if next_free > today => next_free,
        _ => today,
    };
    let end = add_days(start, span_days(task.estimated_hours, hours_per_day) - 1);
    (start, end)
}

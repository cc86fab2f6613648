//! Per-file CSV parsers and the label normalisation they share.

pub mod resources;
pub mod tasks;

use anyhow::Result;
use regex::Regex;
use sprint_core::{Priority, TaskStatus};

/// Lenient parsing of enum-like cells.
///
/// "In Progress", "in-progress" and "IN_PROGRESS" are the same label.
pub struct Labels {
    separators: Regex,
}

impl Labels {
    pub fn new() -> Result<Self> {
        Ok(Self {
            separators: Regex::new(r"[\s_\-]+")?,
        })
    }

    pub fn normalise(&self, s: &str) -> String {
        self.separators.replace_all(s.trim(), "").to_lowercase()
    }

    pub fn priority(&self, s: &str) -> Option<Priority> {
        match self.normalise(s).as_str() {
            "low" => Some(Priority::Low),
            "medium" | "normal" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" | "urgent" => Some(Priority::Critical),
            _ => None,
        }
    }

    pub fn status(&self, s: &str) -> Option<TaskStatus> {
        match self.normalise(s).as_str() {
            "notstarted" | "todo" | "open" => Some(TaskStatus::NotStarted),
            "inprogress" => Some(TaskStatus::InProgress),
            "completed" | "done" => Some(TaskStatus::Completed),
            "onhold" => Some(TaskStatus::OnHold),
            "cancelled" | "canceled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    pub fn flag(&self, s: &str) -> Option<bool> {
        match self.normalise(s).as_str() {
            "true" | "yes" | "y" | "1" | "active" => Some(true),
            "false" | "no" | "n" | "0" | "inactive" => Some(false),
            _ => None,
        }
    }
}

/// 1-based source line of a CSV record, for issue reports.
pub(crate) fn line_of(record: &csv::StringRecord, fallback: u64) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(fallback)
}

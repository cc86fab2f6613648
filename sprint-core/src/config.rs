//! Engine tuning knobs. Every field has a default so a partial
//! `[engine]` table in a config file is enough.

use serde::{Deserialize, Serialize};

/// How a multi-day task's hours land on each day of its planned window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourApportionment {
    /// Full estimated hours on every spanned day. Over-counts long tasks.
    FullSpan,
    /// Estimated hours divided evenly across the spanned days.
    #[default]
    EvenSplit,
}

pub const MAX_TIMELINE_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Used both for planned-window length and the overload threshold.
    pub working_hours_per_day: u32,
    pub apportionment: HourApportionment,
    /// Optimistic-commit attempts per mutation before a conflict is surfaced.
    pub max_commit_attempts: u32,
    pub default_auto_assign_limit: i32,
    /// Length of the timeline window in the planning view.
    pub timeline_days: u32,
    pub default_page_size: usize,
    /// IANA timezone name used to decide "today".
    pub timezone: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            working_hours_per_day: 8,
            apportionment: HourApportionment::EvenSplit,
            max_commit_attempts: 3,
            default_auto_assign_limit: 10,
            timeline_days: 14,
            default_page_size: 20,
            timezone: "UTC".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn hours_per_day(&self) -> u32 {
        self.working_hours_per_day.max(1)
    }

    pub fn commit_attempts(&self) -> u32 {
        self.max_commit_attempts.max(1)
    }

    /// Planning-view timeline length, between one day and a year.
    pub fn timeline_window_days(&self) -> i64 {
        i64::from(self.timeline_days.clamp(1, MAX_TIMELINE_DAYS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_fills_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"apportionment":"full_span"}"#).unwrap();
        assert_eq!(cfg.apportionment, HourApportionment::FullSpan);
        assert_eq!(cfg.working_hours_per_day, 8);
        assert_eq!(cfg.max_commit_attempts, 3);
    }

    #[test]
    fn zero_values_are_clamped() {
        let cfg = EngineConfig {
            working_hours_per_day: 0,
            max_commit_attempts: 0,
            timeline_days: 0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.hours_per_day(), 1);
        assert_eq!(cfg.commit_attempts(), 1);
        assert_eq!(cfg.timeline_window_days(), 1);

        let wide = EngineConfig {
            timeline_days: u32::MAX,
            ..EngineConfig::default()
        };
        assert_eq!(wide.timeline_window_days(), 366);
    }
}

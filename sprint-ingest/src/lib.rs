//! sprint-ingest: CSV import of backlog tasks, operators and machines.
//!
//! Bad rows are skipped and reported, never fatal; only an unreadable
//! file is an error.

pub mod parsers;
pub mod types;

pub use parsers::resources::{parse_machines_csv, parse_operators_csv};
pub use parsers::tasks::parse_tasks_csv;
pub use types::{Parsed, RowIssue};

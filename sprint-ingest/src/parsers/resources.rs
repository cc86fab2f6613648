//! Operator and machine CSVs.
//!
//! operators: id,full_name,is_active,weekly_capacity_hours
//! machines:  id,name,is_active,weekly_capacity_hours
//!
//! `is_active` may be omitted (defaults to active).

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sprint_core::{Machine, Operator};

use super::{line_of, Labels};
use crate::types::Parsed;

#[derive(Debug, Deserialize)]
struct ResourceRow {
    id: u64,
    #[serde(alias = "full_name")]
    name: String,
    #[serde(default)]
    is_active: Option<String>,
    weekly_capacity_hours: u32,
}

/// Shared shape after validation.
struct Resource {
    id: u64,
    name: String,
    is_active: bool,
    weekly_capacity_hours: u32,
}

pub fn parse_operators_csv(path: impl AsRef<Path>) -> Result<Parsed<Operator>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_operators_reader(file)
}

pub fn parse_operators_reader(reader: impl Read) -> Result<Parsed<Operator>> {
    parse_resources(reader, "operator", |r| Operator {
        id: r.id,
        full_name: r.name,
        is_active: r.is_active,
        weekly_capacity_hours: r.weekly_capacity_hours,
    })
}

pub fn parse_machines_csv(path: impl AsRef<Path>) -> Result<Parsed<Machine>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_machines_reader(file)
}

pub fn parse_machines_reader(reader: impl Read) -> Result<Parsed<Machine>> {
    parse_resources(reader, "machine", |r| Machine {
        id: r.id,
        name: r.name,
        is_active: r.is_active,
        weekly_capacity_hours: r.weekly_capacity_hours,
    })
}

fn parse_resources<T>(
    reader: impl Read,
    kind: &str,
    build: impl Fn(Resource) -> T,
) -> Result<Parsed<T>> {
    let labels = Labels::new()?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .with_context(|| format!("reading {kind} CSV header"))?
        .clone();

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

        let row: ResourceRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                out.skip(line, e.to_string());
                continue;
            }
        };

        if row.name.trim().is_empty() {
            out.skip(line, format!("{kind} {} has no name", row.id));
            continue;
        }
        let is_active = match row.is_active.as_deref() {
            Some(flag) => match labels.flag(flag) {
                Some(b) => b,
                None => {
                    out.skip(line, format!("unknown is_active value '{flag}'"));
                    continue;
                }
            },
            None => true,
        };
        if !seen.insert(row.id) {
            out.skip(line, format!("duplicate {kind} id {}", row.id));
            continue;
        }

        out.records.push(build(Resource {
            id: row.id,
            name: row.name.trim().to_string(),
            is_active,
            weekly_capacity_hours: row.weekly_capacity_hours,
        }));
    }

    if !out.is_clean() {
        tracing::warn!(kind, skipped = out.issues.len(), "resource CSV rows skipped");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_default_to_active() {
        let csv = "\
id,full_name,is_active,weekly_capacity_hours
1,Ana Ruiz,yes,40
2,Ben Okafor,,32
3,Cy Tran,no,40
";
        let parsed = parse_operators_reader(csv.as_bytes()).unwrap();
        assert!(parsed.is_clean());
        let active: Vec<bool> = parsed.records.iter().map(|o| o.is_active).collect();
        assert_eq!(active, vec![true, true, false]);
        assert_eq!(parsed.records[1].weekly_capacity_hours, 32);
        assert_eq!(parsed.records[0].full_name, "Ana Ruiz");
    }

    #[test]
    fn machines_reject_negative_capacity_and_duplicates() {
        let csv = "\
id,name,weekly_capacity_hours
10,Lathe,60
11,Mill,-5
10,Lathe again,60
";
        let parsed = parse_machines_reader(csv.as_bytes()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].name, "Lathe");
        assert_eq!(parsed.issues.len(), 2);
        assert_eq!(parsed.issues[1].line, 4);
    }

    #[test]
    fn invalid_row_leaves_its_id_free() {
        let csv = "\
id,full_name,is_active,weekly_capacity_hours
7,,yes,40
7,Dee Park,sometimes,40
7,Dee Park,yes,40
";
        let parsed = parse_operators_reader(csv.as_bytes()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].full_name, "Dee Park");
        let lines: Vec<u64> = parsed.issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }
}

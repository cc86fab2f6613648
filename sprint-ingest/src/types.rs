use serde::{Deserialize, Serialize};

/// A CSV row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based line in the source file (header is line 1).
    pub line: u64,
    pub message: String,
}

/// Parser output: the rows that made it, plus the ones that didn't.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub issues: Vec<RowIssue>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl<T> Parsed<T> {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub(crate) fn skip(&mut self, line: u64, message: impl Into<String>) {
        self.issues.push(RowIssue {
            line,
            message: message.into(),
        });
    }
}

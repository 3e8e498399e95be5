//! Run statistics tracking.
//!
//! Counts how many contacts a reconciliation run looked at, how many already
//! existed, and how many rows the writes actually changed.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to a single input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    /// The email was already present; name and phone were overwritten.
    Updated,
    /// The email was new; a row was inserted.
    Inserted,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::Updated => "exist",
            RowAction::Inserted => "not exist",
        }
    }
}

/// Per-row trace entry, for logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTrace {
    /// 1-based position in the input.
    pub ordinal: usize,
    pub email: String,
    pub action: RowAction,
    pub rows_affected: u64,
}

/// Counters for one reconciliation run.
///
/// `existing_count + new_count == total_count` always holds after
/// [`RunSummary::record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_count: usize,
    pub existing_count: usize,
    pub new_count: usize,
    /// Sum of rows reported changed by each update or insert.
    pub changed_rows_total: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn start() -> Self {
        Self {
            total_count: 0,
            existing_count: 0,
            new_count: 0,
            changed_rows_total: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Account for one processed record and return its trace entry.
    pub fn record(&mut self, email: &str, action: RowAction, rows_affected: u64) -> RowTrace {
        self.total_count += 1;
        match action {
            RowAction::Updated => self.existing_count += 1,
            RowAction::Inserted => self.new_count += 1,
        }
        self.changed_rows_total += rows_affected;

        RowTrace {
            ordinal: self.total_count,
            email: email.to_string(),
            action,
            rows_affected,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Contact sync summary:")?;
        writeln!(f, "  existing emails updated: {}", self.existing_count)?;
        writeln!(f, "  new emails inserted: {}", self.new_count)?;
        writeln!(f, "  total emails processed: {}", self.total_count)?;
        writeln!(f, "  total changed rows: {}", self.changed_rows_total)?;
        Ok(())
    }
}

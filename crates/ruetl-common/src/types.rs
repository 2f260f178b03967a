//! Shared batch-outcome types
//!
//! Pipeline stages process records independently and never abort a whole
//! batch on a single bad record. Instead of suppressing errors in place,
//! each stage returns a [`BatchOutcome`] describing what succeeded and
//! exactly which records were skipped, and why.

use serde::Serialize;

/// Why a single record was skipped during a batch stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorKind {
    /// Birth-date string did not match the expected format
    MalformedDate,
    /// Record was missing required structure or failed to deserialize
    MalformedRecord,
    /// Database insert failed for this record
    Insert,
}

impl std::fmt::Display for RecordErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordErrorKind::MalformedDate => write!(f, "malformed_date"),
            RecordErrorKind::MalformedRecord => write!(f, "malformed_record"),
            RecordErrorKind::Insert => write!(f, "insert"),
        }
    }
}

/// A single skipped record, with enough context to find it again
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    /// Identifying context: derived id when available, otherwise a
    /// positional marker like "record 3"
    pub record: String,
    pub kind: RecordErrorKind,
    pub detail: String,
}

/// Outcome report for one batch stage invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failures: Vec<RecordFailure>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful record
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Record one skipped record
    pub fn record_failure(
        &mut self,
        record: impl Into<String>,
        kind: RecordErrorKind,
        detail: impl Into<String>,
    ) {
        self.failures.push(RecordFailure {
            record: record.into(),
            kind,
            detail: detail.into(),
        });
    }

    /// Total records seen by the stage
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

//! Processing snapshots
//!
//! A [`ProcessingState`] is the whole description of a job at one point in
//! time. The driver never mutates a snapshot it was given; every step builds
//! a new one.

use crate::error::ExtractorError;
use crate::queue::QueueItem;
use crate::registry::{ColumnDef, ColumnRegistry};
use datarip_domain::{JobId, Row};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Why a job stopped before finishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Zero-based index of the row that failed
    pub row_index: usize,

    /// What went wrong
    pub reason: String,
}

impl From<&ItemFailure> for ExtractorError {
    fn from(failure: &ItemFailure) -> Self {
        ExtractorError::ExtractionItem {
            row_index: failure.row_index,
            reason: failure.reason.clone(),
        }
    }
}

/// Lifecycle phase of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    /// No job in flight
    Idle,
    /// Queue non-empty and ticking
    Running,
    /// Queue non-empty but not ticking, with no failure recorded
    Paused,
    /// Stopped on a failed row
    Halted,
    /// Every row processed
    Completed,
}

impl JobPhase {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Idle => "idle",
            JobPhase::Running => "running",
            JobPhase::Paused => "paused",
            JobPhase::Halted => "halted",
            JobPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable snapshot of an extraction job
///
/// Invariants:
/// - `completed + queue.len() == total`
/// - `processed_rows.len() == completed`
/// - a halted snapshot is not processing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessingState {
    /// Identifier of the job; nil when idle
    pub job_id: JobId,

    /// Whether ticks should advance the job
    pub processing: bool,

    /// Rows still to process, head first
    pub queue: VecDeque<QueueItem>,

    /// Rows processed so far
    pub completed: usize,

    /// Rows in the job, fixed when it starts
    pub total: usize,

    /// Output columns
    pub columns: ColumnRegistry,

    /// Merged rows, in input order
    pub processed_rows: Vec<Row>,

    /// Set when a row failed and the job stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halted: Option<ItemFailure>,
}

impl ProcessingState {
    /// The initial snapshot: no job
    pub fn idle() -> Self {
        Self::default()
    }

    /// Current phase
    pub fn phase(&self) -> JobPhase {
        if self.halted.is_some() {
            JobPhase::Halted
        } else if self.queue.is_empty() {
            if self.completed > 0 {
                JobPhase::Completed
            } else {
                JobPhase::Idle
            }
        } else if self.processing {
            JobPhase::Running
        } else {
            JobPhase::Paused
        }
    }

    /// Whether a job is in flight and ticking
    pub fn is_running(&self) -> bool {
        self.phase() == JobPhase::Running
    }

    /// Whether ticking can no longer make progress
    pub fn is_finished(&self) -> bool {
        matches!(self.phase(), JobPhase::Completed | JobPhase::Halted)
    }

    /// Integer percentage of rows completed, rounded down
    pub fn progress(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        // completed <= total, so this is at most 100
        (self.completed * 100 / self.total) as u8
    }

    /// Human-readable description of where the job is
    pub fn status(&self) -> String {
        match self.phase() {
            JobPhase::Idle => "No extraction in progress".to_string(),
            JobPhase::Running => format!(
                "Processed {} of {} rows",
                self.completed, self.total
            ),
            JobPhase::Paused => format!(
                "Paused after {} of {} rows",
                self.completed, self.total
            ),
            JobPhase::Halted => match &self.halted {
                Some(failure) => format!(
                    "Halted at row {}: {}",
                    failure.row_index, failure.reason
                ),
                None => "Halted".to_string(),
            },
            JobPhase::Completed => format!("Extraction complete: {} rows", self.total),
        }
    }

    /// Check the snapshot's structural invariants
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.completed + self.queue.len() != self.total {
            return Err(ExtractorError::InvalidState(format!(
                "completed ({}) + queued ({}) != total ({})",
                self.completed,
                self.queue.len(),
                self.total
            )));
        }
        if self.processed_rows.len() != self.completed {
            return Err(ExtractorError::InvalidState(format!(
                "{} processed rows but completed is {}",
                self.processed_rows.len(),
                self.completed
            )));
        }
        if self.halted.is_some() && self.processing {
            return Err(ExtractorError::InvalidState(
                "halted snapshot is still marked processing".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize the snapshot for persistence
    pub fn to_json(&self) -> Result<String, ExtractorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a persisted snapshot, checking its invariants
    pub fn from_json(json: &str) -> Result<Self, ExtractorError> {
        let state: ProcessingState = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }

    /// Observable output at the snapshot's own progress
    pub fn output(&self) -> StepOutput {
        if self.phase() == JobPhase::Idle {
            return StepOutput::empty(self.status());
        }
        StepOutput {
            columns: self.columns.to_vec(),
            rows: self.processed_rows.clone(),
            progress: self.progress(),
            status: self.status(),
        }
    }
}

/// What a tick shows to the outside world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Output columns, in order
    pub columns: Vec<ColumnDef>,

    /// Processed rows so far
    pub rows: Vec<Row>,

    /// Integer percentage
    pub progress: u8,

    /// Human-readable status
    pub status: String,
}

impl StepOutput {
    /// Empty table at 0%
    pub fn empty(status: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            progress: 0,
            status: status.into(),
        }
    }
}

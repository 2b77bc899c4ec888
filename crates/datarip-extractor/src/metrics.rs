//! Metrics collection for extraction jobs

use crate::state::ProcessingState;
use std::time::Duration;

/// Counters kept by the worker across ticks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobMetrics {
    /// Ticks executed
    pub ticks: usize,

    /// Ticks that processed no row
    pub idle_ticks: usize,

    /// Rows merged into the output
    pub rows_extracted: usize,

    /// Output columns discovered from extraction results
    pub columns_added: usize,

    /// Times a job halted on a failed row
    pub halts: usize,

    /// Ticks cut short by the step timeout
    pub timeouts: usize,

    /// Wall-clock time spent in the run loop
    pub total_runtime: Duration,
}

impl JobMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick from `before` to `after`
    pub fn record_tick(&mut self, before: &ProcessingState, after: &ProcessingState) {
        self.ticks += 1;

        let rows = after.completed.saturating_sub(before.completed);
        if rows == 0 {
            self.idle_ticks += 1;
        }
        self.rows_extracted += rows;
        self.columns_added += after.columns.len().saturating_sub(before.columns.len());

        if after.halted.is_some() && before.halted.is_none() {
            self.halts += 1;
        }
    }

    /// Record a tick that exceeded its time bound
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    /// Add run-loop time
    pub fn record_runtime(&mut self, elapsed: Duration) {
        self.total_runtime += elapsed;
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Extraction Metrics Summary".to_string(),
            "==========================".to_string(),
            format!("Ticks: {} ({} idle)", self.ticks, self.idle_ticks),
            format!("Rows extracted: {}", self.rows_extracted),
            format!("Columns added: {}", self.columns_added),
            format!("Total runtime: {:.2?}", self.total_runtime),
        ];

        if self.halts > 0 {
            lines.push(format!("Halts: {}", self.halts));
        }
        if self.timeouts > 0 {
            lines.push(format!("Timeouts: {}", self.timeouts));
        }

        lines.join("\n")
    }
}

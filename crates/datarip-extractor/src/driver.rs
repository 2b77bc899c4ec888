//! The extraction job state machine
//!
//! [`ExtractionDriver::step`] is a reducer: it takes a snapshot and returns
//! the next one without touching the input. Callers funnel every `start` and
//! `step` through one sequential point, so the driver needs no locking.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_tool_arguments;
use crate::prompt::extraction_messages;
use crate::queue::{build_queue, QueueItem};
use crate::registry::ColumnRegistry;
use crate::state::{ItemFailure, JobPhase, ProcessingState, StepOutput};
use datarip_domain::traits::LlmProvider;
use datarip_domain::{JobId, Schema, Table};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one tick: the next snapshot and what to show
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Next snapshot
    pub state: ProcessingState,

    /// Observable output for this tick
    pub output: StepOutput,
}

impl Tick {
    fn unchanged(state: &ProcessingState, output: StepOutput) -> Self {
        Self {
            state: state.clone(),
            output,
        }
    }

    /// The row failure recorded by this tick's snapshot, if any
    pub fn failure(&self) -> Option<ExtractorError> {
        self.state.halted.as_ref().map(ExtractorError::from)
    }
}

/// Drives extraction jobs one row per tick
pub struct ExtractionDriver<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: ExtractorConfig,
}

impl<L> ExtractionDriver<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a driver over a provider
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(llm_provider), config)
    }

    /// Create a driver sharing an existing provider handle
    pub fn from_shared(llm_provider: Arc<L>, config: ExtractorConfig) -> Self {
        Self {
            llm_provider,
            config,
        }
    }

    /// Get the driver's configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Start a job over `table`, returning the first Running snapshot
    ///
    /// `current` is the caller's present snapshot; it is only inspected, and
    /// a second start while it is Running is rejected. On any error the
    /// caller keeps `current` as is.
    pub fn start(
        &self,
        current: &ProcessingState,
        schema: &Schema,
        table: &Table,
        text_column: &str,
        existing_columns: &[String],
    ) -> Result<ProcessingState, ExtractorError> {
        if current.is_running() {
            return Err(ExtractorError::JobStart(format!(
                "job {} is still running",
                current.job_id
            )));
        }
        if schema.is_empty() {
            return Err(ExtractorError::JobStart(
                "schema declares no fields".to_string(),
            ));
        }

        let queue = build_queue(
            schema,
            table,
            text_column,
            &self.config.function_name,
            &self.config.function_description,
        )?;

        let state = ProcessingState {
            job_id: JobId::new(),
            processing: true,
            total: queue.len(),
            queue: queue.into(),
            completed: 0,
            columns: ColumnRegistry::seeded(existing_columns.iter().cloned()),
            processed_rows: Vec::new(),
            halted: None,
        };

        info!(
            "Started job {}: {} rows, {} schema fields, text column '{}'",
            state.job_id,
            state.total,
            schema.len(),
            text_column
        );
        Ok(state)
    }

    /// Advance `state` by one row
    ///
    /// Never fails: a row whose extraction fails yields the previous snapshot
    /// halted at that row, with nothing merged.
    pub async fn step(&self, state: &ProcessingState) -> Tick {
        match state.phase() {
            JobPhase::Halted => {
                debug!("Tick on halted job {}; nothing to do", state.job_id);
                return Tick::unchanged(state, state.output());
            }
            _ if !state.processing && state.completed == 0 => {
                return Tick::unchanged(state, StepOutput::empty(state.status()));
            }
            JobPhase::Completed => return self.terminal(state),
            JobPhase::Paused => return Tick::unchanged(state, state.output()),
            JobPhase::Idle | JobPhase::Running => {}
        }

        let Some(item) = state.queue.front() else {
            return self.terminal(state);
        };
        debug!(
            "Job {}: extracting row {} of {}",
            state.job_id,
            state.completed + 1,
            state.total
        );

        let extracted = match self.extract(item).await {
            Ok(extracted) => extracted,
            Err(reason) => {
                let next = self.halt(state, reason);
                let output = next.output();
                return Tick {
                    state: next,
                    output,
                };
            }
        };

        let mut next = state.clone();
        next.queue.pop_front();
        let added = next.columns.merge_keys(extracted.keys().cloned());
        next.processed_rows.push(item.row.merged_with(&extracted));
        next.completed += 1;
        next.processing = !next.queue.is_empty();

        if added > 0 {
            debug!("Job {}: {} new columns", next.job_id, added);
        }
        if !next.processing {
            info!(
                "Job {} complete: {} rows, {} columns",
                next.job_id,
                next.completed,
                next.columns.len()
            );
        }

        let output = next.output();
        Tick {
            state: next,
            output,
        }
    }

    /// Clear a halt so the failed row is retried on the next tick
    ///
    /// Also restarts a paused snapshot. Anything else is rejected.
    pub fn resume(&self, state: &ProcessingState) -> Result<ProcessingState, ExtractorError> {
        match state.phase() {
            JobPhase::Halted | JobPhase::Paused => {
                let mut next = state.clone();
                next.halted = None;
                next.processing = true;
                info!(
                    "Resuming job {} at row {}",
                    next.job_id, next.completed
                );
                Ok(next)
            }
            phase => Err(ExtractorError::InvalidState(format!(
                "cannot resume a {} job",
                phase
            ))),
        }
    }

    /// Stop ticking a running job without recording a failure
    ///
    /// The result is Paused and can be restarted with [`resume`](Self::resume).
    /// Any other snapshot is returned as is.
    pub fn pause(&self, state: &ProcessingState) -> ProcessingState {
        let mut next = state.clone();
        if state.phase() == JobPhase::Running {
            info!(
                "Pausing job {} at row {} of {}",
                state.job_id, state.completed, state.total
            );
            next.processing = false;
        }
        next
    }

    /// Halted copy of `state`, blaming the head row
    pub fn halt(&self, state: &ProcessingState, reason: impl Into<String>) -> ProcessingState {
        let reason = reason.into();
        warn!(
            "Halting job {} at row {}: {}",
            state.job_id, state.completed, reason
        );
        let mut next = state.clone();
        next.processing = false;
        next.halted = Some(ItemFailure {
            row_index: state.completed,
            reason,
        });
        next
    }

    fn terminal(&self, state: &ProcessingState) -> Tick {
        let mut next = state.clone();
        next.processing = false;
        let mut output = next.output();
        output.progress = 100;
        Tick {
            state: next,
            output,
        }
    }

    async fn extract(&self, item: &QueueItem) -> Result<Map<String, Value>, String> {
        let llm = Arc::clone(&self.llm_provider);
        let tool = Arc::clone(&item.tool);
        let messages = extraction_messages(&item.text());

        let arguments = tokio::task::spawn_blocking(move || {
            llm.generate_tool_call(&messages, &tool)
                .map_err(|e| format!("LLM error: {}", e))
        })
        .await
        .map_err(|e| format!("Task join error: {}", e))??;

        parse_tool_arguments(&arguments).map_err(|e| e.to_string())
    }
}

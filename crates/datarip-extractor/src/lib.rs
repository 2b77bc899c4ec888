//! Datarip Extractor
//!
//! Compiles natural-language instructions into field schemas and drives
//! row-by-row extraction jobs over a table.
//!
//! # Overview
//!
//! A job walks a queue of rows one row per tick. Each tick sends the row's
//! text cell to the provider with a forced tool call, merges the returned
//! fields into a copy of the row, grows the output column set, and reports
//! progress. The driver is a reducer over immutable [`ProcessingState`]
//! snapshots; [`ExtractionWorker`] supplies the tick source.
//!
//! # Architecture
//!
//! ```text
//! instruction → SchemaCompiler → Schema
//! (Schema + Table) → ExtractionDriver::start → ProcessingState
//! ProcessingState → ExtractionDriver::step → ProcessingState' (once per tick)
//! ```
//!
//! # Failure policy
//!
//! A row whose extraction fails halts the job: the tick returns the previous
//! snapshot with `processing = false` and the failing row index recorded.
//! [`ExtractionDriver::resume`] retries that row.
//!
//! # Example Usage
//!
//! ```
//! use datarip_domain::{Row, Table};
//! use datarip_extractor::{ExtractionDriver, ExtractorConfig, ProcessingState, SchemaCompiler};
//! use datarip_llm::MockProvider;
//!
//! # async fn example() -> Result<(), datarip_extractor::ExtractorError> {
//! let llm = MockProvider::default();
//! llm.add_response("Extract the name", r#"{"properties": {"name": {"type": "string"}}, "required": ["name"]}"#);
//! llm.add_response("Alice is 30", r#"{"name": "Alice"}"#);
//!
//! let schema = SchemaCompiler::new(llm.clone()).compile("Extract the name").await?;
//!
//! let table = Table::new(
//!     vec!["id".to_string(), "text".to_string()],
//!     vec![Row::new().with("id", 1).with("text", "Alice is 30")],
//! );
//! let driver = ExtractionDriver::new(llm, ExtractorConfig::default());
//! let state = driver.start(&ProcessingState::idle(), &schema, &table, "text", &table.columns)?;
//!
//! let tick = driver.step(&state).await;
//! assert_eq!(tick.output.progress, 100);
//! assert_eq!(tick.state.processed_rows[0].get("name").unwrap(), "Alice");
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```

#![warn(missing_docs)]

mod compiler;
mod config;
mod driver;
mod error;
mod metrics;
pub mod parser;
pub mod prompt;
mod queue;
mod registry;
mod state;
mod worker;

#[cfg(test)]
mod tests;

pub use compiler::SchemaCompiler;
pub use config::{ExtractorConfig, DEFAULT_FUNCTION_DESCRIPTION, DEFAULT_FUNCTION_NAME};
pub use driver::{ExtractionDriver, Tick};
pub use error::ExtractorError;
pub use metrics::JobMetrics;
pub use queue::{build_queue, QueueItem};
pub use registry::{ColumnDef, ColumnRegistry};
pub use state::{ItemFailure, JobPhase, ProcessingState, StepOutput};
pub use worker::ExtractionWorker;

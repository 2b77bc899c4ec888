//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur while compiling schemas or driving jobs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Instruction was empty; nothing was sent to the provider
    #[error("Instruction is empty")]
    EmptyInstruction,

    /// Compiled text is not a usable schema
    #[error("Schema parse error: {0}")]
    SchemaParse(String),

    /// Job could not be started; the caller's state is unchanged
    #[error("Job start error: {0}")]
    JobStart(String),

    /// Extraction for a single row failed
    #[error("Extraction failed for row {row_index}: {reason}")]
    ExtractionItem {
        /// Zero-based index of the row in input order
        row_index: usize,
        /// What went wrong
        reason: String,
    },

    /// Snapshot is not in a state that allows the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A tick exceeded the configured time bound
    #[error("Extraction timeout")]
    Timeout,

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

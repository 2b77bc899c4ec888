//! Job queue construction

use crate::error::ExtractorError;
use datarip_domain::{Row, Schema, Table, ToolDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One pending row of an extraction job
///
/// Built once when the job starts and read-only afterwards. All items of a
/// job share the same tool descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// The input row
    pub row: Row,

    /// Column whose value is sent to the extraction service
    pub text_column: String,

    /// Forced tool derived from the job's schema
    pub tool: Arc<ToolDescriptor>,
}

impl QueueItem {
    /// Text handed to the extraction service for this row
    pub fn text(&self) -> String {
        self.row.text(&self.text_column)
    }
}

/// Build one queue item per row, in input order
///
/// Fails when the table has no rows or `text_column` is not one of its
/// columns.
pub fn build_queue(
    schema: &Schema,
    table: &Table,
    text_column: &str,
    function_name: &str,
    function_description: &str,
) -> Result<Vec<QueueItem>, ExtractorError> {
    if table.is_empty() {
        return Err(ExtractorError::JobStart("no rows to process".to_string()));
    }
    if !table.has_column(text_column) {
        return Err(ExtractorError::JobStart(format!(
            "text column '{}' not found (available: {})",
            text_column,
            table.columns.join(", ")
        )));
    }

    let tool = Arc::new(ToolDescriptor::from_schema(
        schema,
        function_name,
        function_description,
    ));

    Ok(table
        .rows
        .iter()
        .map(|row| QueueItem {
            row: row.clone(),
            text_column: text_column.to_string(),
            tool: Arc::clone(&tool),
        })
        .collect())
}

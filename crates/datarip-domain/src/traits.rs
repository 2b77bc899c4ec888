//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction core and
//! infrastructure. Implementations live in other crates.

use crate::tool::{ChatMessage, ToolDescriptor};

/// Trait for language-model provider operations
///
/// Implemented by the infrastructure layer (datarip-llm). Calls are blocking;
/// async callers run them on a blocking thread.
pub trait LlmProvider {
    /// Error type for provider operations
    type Error;

    /// Chat completion: returns the text of the single completion
    fn generate(&self, messages: &[ChatMessage]) -> Result<String, Self::Error>;

    /// Chat completion forced to call `tool` exactly once
    ///
    /// Returns the raw JSON text of the tool call's arguments.
    fn generate_tool_call(
        &self,
        messages: &[ChatMessage],
        tool: &ToolDescriptor,
    ) -> Result<String, Self::Error>;
}

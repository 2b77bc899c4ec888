//! Schema compilation: natural-language instruction to field schema

use crate::error::ExtractorError;
use crate::parser::parse_schema;
use crate::prompt::schema_messages;
use datarip_domain::traits::LlmProvider;
use datarip_domain::Schema;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns a free-text instruction into a [`Schema`]
///
/// Every call to [`compile`](Self::compile) makes exactly one provider call
/// and never retries. A completion that does not parse yields an error and
/// no partial schema.
pub struct SchemaCompiler<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
}

impl<L> SchemaCompiler<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a compiler over a provider
    pub fn new(llm_provider: L) -> Self {
        Self {
            llm_provider: Arc::new(llm_provider),
        }
    }

    /// Compile an instruction into a schema
    pub async fn compile(&self, instruction: &str) -> Result<Schema, ExtractorError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(ExtractorError::EmptyInstruction);
        }

        let messages = schema_messages(instruction);
        debug!(
            "Compiling schema from instruction ({} chars, {} messages)",
            instruction.len(),
            messages.len()
        );

        let llm = Arc::clone(&self.llm_provider);
        let completion = tokio::task::spawn_blocking(move || {
            llm.generate(&messages)
                .map_err(|e| ExtractorError::Llm(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::Llm(format!("Task join error: {}", e)))??;

        let schema = parse_schema(&completion)?;
        info!("Compiled schema with {} fields", schema.len());
        Ok(schema)
    }
}

//! Run command implementation.

use crate::cli::RunArgs;
use crate::commands::build_provider;
use crate::commands::job::{drive, finish};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::input::{project_id_text, read_schema, read_table};
use crate::output::Formatter;
use datarip_domain::traits::LlmProvider;
use datarip_domain::{Schema, Table};
use datarip_extractor::{
    ExtractionDriver, ExtractionWorker, ExtractorConfig, ProcessingState, SchemaCompiler,
};
use std::path::Path;

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut table = read_table(&args.file)?;
    if let Some(id_column) = &args.id_column {
        table = project_id_text(&table, id_column, &args.text_column)?;
    }

    let schema = match (&args.schema, &args.instruction) {
        (Some(path), _) => read_schema(path)?,
        (None, Some(instruction)) => {
            let provider = build_provider(&config.provider, &config.provider.schema_model)?;
            SchemaCompiler::new(provider).compile(instruction).await?
        }
        (None, None) => {
            return Err(CliError::InvalidInput(
                "either --schema or --instruction is required".to_string(),
            ))
        }
    };

    let provider = build_provider(&config.provider, &config.provider.extraction_model)?;
    let last = run_job(
        provider,
        config.extractor.clone(),
        &schema,
        &table,
        &args.text_column,
        args.state.as_deref(),
        formatter,
    )
    .await?;

    finish(&last, formatter, args.output.as_deref(), args.state.as_deref())
}

/// Start a job over `table` and tick it until it stops.
pub async fn run_job<L>(
    llm: L,
    extractor: ExtractorConfig,
    schema: &Schema,
    table: &Table,
    text_column: &str,
    state_path: Option<&Path>,
    formatter: &Formatter,
) -> Result<ProcessingState>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    let driver = ExtractionDriver::new(llm, extractor);
    let state = driver.start(
        &ProcessingState::idle(),
        schema,
        table,
        text_column,
        &table.columns,
    )?;

    let mut worker = ExtractionWorker::new(driver);
    drive(&mut worker, state, state_path, formatter).await
}

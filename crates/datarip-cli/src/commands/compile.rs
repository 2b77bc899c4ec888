//! Compile command implementation.

use crate::cli::CompileArgs;
use crate::commands::build_provider;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use datarip_extractor::SchemaCompiler;
use std::fs;

/// Execute the compile command.
pub async fn execute_compile(
    args: CompileArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let provider = build_provider(&config.provider, &config.provider.schema_model)?;
    let schema = SchemaCompiler::new(provider).compile(&args.instruction).await?;

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&schema)?)?;
        eprintln!(
            "{}",
            formatter.success(&format!(
                "Schema with {} fields written to {}",
                schema.len(),
                path.display()
            ))
        );
    }

    println!("{}", formatter.format_schema(&schema)?);
    Ok(())
}

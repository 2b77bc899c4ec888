//! Resume command implementation.

use crate::cli::ResumeArgs;
use crate::commands::build_provider;
use crate::commands::job::{drive, finish, load_state};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use datarip_domain::traits::LlmProvider;
use datarip_extractor::{
    ExtractionDriver, ExtractionWorker, ExtractorConfig, JobPhase, ProcessingState,
};
use std::path::Path;

/// Execute the resume command.
pub async fn execute_resume(
    args: ResumeArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let state = load_state(&args.state)?;

    let last = if state.phase() == JobPhase::Completed {
        eprintln!("{}", formatter.info("Job already complete"));
        state
    } else {
        let provider = build_provider(&config.provider, &config.provider.extraction_model)?;
        resume_job(provider, config.extractor.clone(), state, &args.state, formatter).await?
    };

    finish(&last, formatter, args.output.as_deref(), Some(&args.state))
}

/// Re-drive a persisted snapshot, retrying a halted row first.
pub async fn resume_job<L>(
    llm: L,
    extractor: ExtractorConfig,
    state: ProcessingState,
    state_path: &Path,
    formatter: &Formatter,
) -> Result<ProcessingState>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    let driver = ExtractionDriver::new(llm, extractor);
    let state = match state.phase() {
        JobPhase::Idle => {
            return Err(CliError::InvalidInput(format!(
                "{} holds no job",
                state_path.display()
            )))
        }
        JobPhase::Completed | JobPhase::Running => state,
        JobPhase::Halted | JobPhase::Paused => driver.resume(&state)?,
    };

    let mut worker = ExtractionWorker::new(driver);
    drive(&mut worker, state, Some(state_path), formatter).await
}

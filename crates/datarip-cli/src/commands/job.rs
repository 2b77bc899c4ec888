//! Shared plumbing for commands that drive a job.

use crate::error::{CliError, Result};
use crate::output::Formatter;
use datarip_domain::traits::LlmProvider;
use datarip_extractor::{ExtractionWorker, ExtractorError, JobPhase, ProcessingState};
use std::fs;
use std::path::Path;

/// Write a snapshot, replacing the file atomically.
pub fn save_state(path: &Path, state: &ProcessingState) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, state.to_json()?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a snapshot written by [`save_state`].
pub fn load_state(path: &Path) -> Result<ProcessingState> {
    let contents = fs::read_to_string(path)?;
    Ok(ProcessingState::from_json(&contents)?)
}

/// Tick `state` to the end, printing progress and saving every snapshot.
pub async fn drive<L>(
    worker: &mut ExtractionWorker<L>,
    state: ProcessingState,
    state_path: Option<&Path>,
    formatter: &Formatter,
) -> Result<ProcessingState>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    if let Some(path) = state_path {
        save_state(path, &state)?;
    }

    let last = worker
        .run(state, |tick| -> Result<()> {
            eprintln!("{}", formatter.progress(&tick.output));
            if let Some(path) = state_path {
                save_state(path, &tick.state)?;
            }
            Ok(())
        })
        .await?;

    // An interrupted job ends on a snapshot no tick produced
    if let Some(path) = state_path {
        save_state(path, &last)?;
    }
    Ok(last)
}

/// Report the last snapshot and emit the table.
///
/// A halted job is an error; an interrupted one prints what it has.
pub fn finish(
    state: &ProcessingState,
    formatter: &Formatter,
    output_path: Option<&Path>,
    state_path: Option<&Path>,
) -> Result<()> {
    let resume_hint = |path: &Path| {
        formatter.info(&format!(
            "Continue with: datarip resume --state {}",
            path.display()
        ))
    };

    match state.phase() {
        JobPhase::Halted => {
            eprintln!("{}", formatter.error(&state.status()));
            if let Some(path) = state_path {
                eprintln!("{}", resume_hint(path));
            }
            let failure = state
                .halted
                .as_ref()
                .map(ExtractorError::from)
                .unwrap_or_else(|| ExtractorError::InvalidState(state.status()));
            return Err(CliError::Extractor(failure));
        }
        JobPhase::Completed => {}
        _ => {
            eprintln!(
                "{}",
                formatter.warning(&format!(
                    "Stopped after {} of {} rows",
                    state.completed, state.total
                ))
            );
            if let Some(path) = state_path {
                eprintln!("{}", resume_hint(path));
            }
        }
    }

    let output = state.output();
    let rendered = formatter.format_rows(&output.columns, &output.rows)?;
    match output_path {
        Some(path) => {
            fs::write(path, rendered)?;
            eprintln!(
                "{}",
                formatter.success(&format!(
                    "Wrote {} rows to {}",
                    output.rows.len(),
                    path.display()
                ))
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

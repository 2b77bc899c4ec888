//! CLI command definitions and argument parsing.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Datarip - Pull structured fields out of free-text table cells.
#[derive(Debug, Parser)]
#[command(name = "datarip")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DATARIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile an instruction into a field schema
    Compile(CompileArgs),

    /// List the columns of a CSV file
    Columns(ColumnsArgs),

    /// Run an extraction job over a CSV file
    Run(RunArgs),

    /// Continue a job from a saved snapshot
    Resume(ResumeArgs),
}

/// Arguments for the compile command.
#[derive(Debug, Args)]
pub struct CompileArgs {
    /// What to extract, in plain words
    pub instruction: String,

    /// Write the schema as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the columns command.
#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// CSV file
    pub file: PathBuf,
}

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// CSV file to process
    pub file: PathBuf,

    /// Column holding the text to extract from
    #[arg(short, long)]
    pub text_column: String,

    /// Keep only this column and the text column
    #[arg(short, long)]
    pub id_column: Option<String>,

    /// Schema JSON file (as written by `compile --output`)
    #[arg(short, long, conflicts_with = "instruction", required_unless_present = "instruction")]
    pub schema: Option<PathBuf>,

    /// Instruction to compile before running
    #[arg(long)]
    pub instruction: Option<String>,

    /// Save the snapshot here after every tick
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Write the final table here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the resume command.
#[derive(Debug, Args)]
pub struct ResumeArgs {
    /// Snapshot file written by `run --state`
    #[arg(long)]
    pub state: PathBuf,

    /// Write the final table here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Csv => crate::config::OutputFormat::Csv,
        }
    }
}

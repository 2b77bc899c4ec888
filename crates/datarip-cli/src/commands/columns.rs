//! Columns command implementation.

use crate::cli::ColumnsArgs;
use crate::error::Result;
use crate::input::read_columns;
use crate::output::Formatter;

/// Execute the columns command.
pub fn execute_columns(args: ColumnsArgs, formatter: &Formatter) -> Result<()> {
    let columns = read_columns(&args.file)?;
    println!("{}", formatter.format_columns(&columns)?);
    Ok(())
}

//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::input::write_csv;
use colored::*;
use datarip_domain::{Row, Schema};
use datarip_extractor::{ColumnDef, StepOutput};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format processed rows under their output columns.
    pub fn format_rows(&self, columns: &[ColumnDef], rows: &[Row]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
            OutputFormat::Csv => {
                let fields: Vec<String> = columns.iter().map(|c| c.field.clone()).collect();
                let mut buffer = Vec::new();
                write_csv(&mut buffer, &fields, rows)?;
                Ok(String::from_utf8_lossy(&buffer).into_owned())
            }
            OutputFormat::Table => Ok(self.format_rows_table(columns, rows)),
        }
    }

    fn format_rows_table(&self, columns: &[ColumnDef], rows: &[Row]) -> String {
        if rows.is_empty() {
            return self.colorize("No rows.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(columns.iter().map(|c| c.header_name.clone()));
        for row in rows {
            builder.push_record(columns.iter().map(|c| row.text(&c.field)));
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a compiled schema.
    pub fn format_schema(&self, schema: &Schema) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(schema)?),
            OutputFormat::Csv => {
                let mut buffer = Vec::new();
                {
                    let mut writer = csv::Writer::from_writer(&mut buffer);
                    writer.write_record(["field", "type", "required", "description"])?;
                    for (name, spec) in schema.properties() {
                        writer.write_record([
                            name.as_str(),
                            spec.type_name().unwrap_or(""),
                            if schema.is_required(name) { "true" } else { "false" },
                            spec.description.as_deref().unwrap_or(""),
                        ])?;
                    }
                    writer.flush()?;
                }
                Ok(String::from_utf8_lossy(&buffer).into_owned())
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Type", "Required", "Description"]);
                for (name, spec) in schema.properties() {
                    builder.push_record([
                        name.as_str(),
                        spec.type_name().unwrap_or("-"),
                        if schema.is_required(name) { "yes" } else { "no" },
                        spec.description.as_deref().unwrap_or(""),
                    ]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a list of column names.
    pub fn format_columns(&self, columns: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(columns)?),
            OutputFormat::Csv => Ok(columns.join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["#", "Column"]);
                for (i, column) in columns.iter().enumerate() {
                    builder.push_record([(i + 1).to_string(), column.clone()]);
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(table.to_string())
            }
        }
    }

    /// One progress line for a tick.
    pub fn progress(&self, output: &StepOutput) -> String {
        let line = format!("[{:>3}%] {}", output.progress, output.status);
        if output.progress == 100 {
            self.colorize(&line, "green")
        } else {
            self.colorize(&line, "cyan")
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

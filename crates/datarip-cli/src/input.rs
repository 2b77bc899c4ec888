//! Table and schema file I/O.

use crate::error::{CliError, Result};
use csv::{ReaderBuilder, WriterBuilder};
use datarip_domain::{Row, Schema, Table};
use datarip_extractor::parser::parse_schema;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read a CSV file with a header row into a table.
///
/// Cells that look like integers or floats become numbers, empty cells
/// become null, everything else stays text.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            columns
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.clone(), cell_value(cell)))
                .collect::<Row>(),
        );
    }

    tracing::debug!("Read {} rows x {} columns from {}", rows.len(), columns.len(), path.display());
    Ok(Table::new(columns, rows))
}

/// Read only the header row of a CSV file.
pub fn read_columns(path: &Path) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

/// Read a schema file written by `compile --output`.
pub fn read_schema(path: &Path) -> Result<Schema> {
    let contents = fs::read_to_string(path)?;
    Ok(parse_schema(&contents)?)
}

/// Write rows as CSV under the given headers.
pub fn write_csv<W: Write>(writer: W, columns: &[String], rows: &[Row]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| row.text(c)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Project a table onto `[id_column, text_column]`.
pub fn project_id_text(table: &Table, id_column: &str, text_column: &str) -> Result<Table> {
    if !table.has_column(id_column) {
        return Err(CliError::InvalidInput(format!(
            "ID column '{}' not found (available: {})",
            id_column,
            table.columns.join(", ")
        )));
    }
    Ok(table.project(&[id_column.to_string(), text_column.to_string()]))
}

fn cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::from(i);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_table() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "people.csv",
            "id,text,score\n1,Alice is 30,2.5\n2,\"Bob, 40\",\n",
        );

        let table = read_table(&path).unwrap();
        assert_eq!(table.columns, vec!["id", "text", "score"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("id").unwrap(), 1);
        assert_eq!(table.rows[0].get("score").unwrap(), 2.5);
        assert_eq!(table.rows[1].text("text"), "Bob, 40");
        assert_eq!(table.rows[1].get("score"), Some(&Value::Null));
    }

    #[test]
    fn test_read_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "a,b,c\n1,2,3\n");
        assert_eq!(read_columns(&path).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_file() {
        assert!(read_table(Path::new("/definitely/not/here.csv")).is_err());
    }

    #[test]
    fn test_cell_value_text_stays_text() {
        assert_eq!(cell_value("NaN"), Value::String("NaN".to_string()));
        assert_eq!(cell_value("007x"), Value::String("007x".to_string()));
    }

    #[test]
    fn test_write_csv() {
        let rows = vec![
            Row::new().with("id", 1).with("name", "Alice"),
            Row::new().with("id", 2),
        ];
        let mut out = Vec::new();
        write_csv(&mut out, &["id".to_string(), "name".to_string()], &rows).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,name\n1,Alice\n2,\n");
    }

    #[test]
    fn test_project_id_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "extra,id,text\nx,1,hello\n");
        let table = read_table(&path).unwrap();

        let projected = project_id_text(&table, "id", "text").unwrap();
        assert_eq!(projected.columns, vec!["id", "text"]);
        assert!(!projected.rows[0].contains("extra"));

        assert!(project_id_text(&table, "missing", "text").is_err());
    }

    #[test]
    fn test_read_schema_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "schema.json",
            r#"{"properties": {"name": {"type": "string"}}, "required": ["name"]}"#,
        );
        let schema = read_schema(&path).unwrap();
        assert!(schema.is_required("name"));
    }
}

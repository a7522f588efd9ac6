//! Turning report records into text for stdout.

use salesboard_analytics::{Table, Tabular};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::settings::{OutputFormat, OutputSettings};

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
  format:    OutputFormat,
  delimiter: char,
}

impl Renderer {
  pub fn new(output: &OutputSettings) -> anyhow::Result<Self> {
    let mut chars = output.delimiter.chars();
    let delimiter = match (chars.next(), chars.next()) {
      (Some(c), None) if c != '"' && c != '\n' => c,
      _ => anyhow::bail!(
        "output delimiter must be a single character, got {:?}",
        output.delimiter
      ),
    };
    Ok(Self { format: output.format, delimiter })
  }

  /// Render typed engine records. JSON keeps the records' own field types.
  pub fn records<T: Tabular + Serialize>(&self, records: &[T]) -> anyhow::Result<String> {
    match self.format {
      OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
      _ => self.table(&Table::from_records(records)),
    }
  }

  /// Render a table whose columns are only known at run time.
  pub fn table(&self, table: &Table) -> anyhow::Result<String> {
    Ok(match self.format {
      OutputFormat::Table => aligned(table),
      OutputFormat::Delimited => delimited(table, self.delimiter),
      OutputFormat::Json => serde_json::to_string_pretty(&json_objects(table))?,
    })
  }
}

fn aligned(table: &Table) -> String {
  let mut builder = Builder::default();
  builder.push_record(table.headers.iter().cloned());
  for row in &table.rows {
    builder.push_record(row.iter().cloned());
  }
  builder.build().with(Style::blank()).to_string()
}

fn delimited(table: &Table, delimiter: char) -> String {
  let line = |cells: &[String]| {
    cells
      .iter()
      .map(|c| quote(c, delimiter))
      .collect::<Vec<_>>()
      .join(&delimiter.to_string())
  };
  std::iter::once(line(&table.headers))
    .chain(table.rows.iter().map(|row| line(row)))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Quote a field if it holds the delimiter, a quote, or a line break.
fn quote(field: &str, delimiter: char) -> String {
  if field.contains([delimiter, '"', '\n', '\r']) {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_string()
  }
}

fn json_objects(table: &Table) -> Vec<serde_json::Map<String, serde_json::Value>> {
  table
    .rows
    .iter()
    .map(|row| {
      table
        .headers
        .iter()
        .cloned()
        .zip(row.iter().map(|c| serde_json::Value::String(c.clone())))
        .collect()
    })
    .collect()
}

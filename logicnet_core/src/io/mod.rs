//! Module for reading pathway tables, and writing logic networks
pub mod cache;
pub mod json;

use indexmap::IndexSet;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Table {table} is missing required columns: {}. Available columns: {}", .missing.join(", "), .available.join(", "))]
    SchemaMismatch {
        table: String,
        missing: Vec<String>,
        available: Vec<String>,
    },
    #[error("Table {table} has no rows")]
    EmptyTable { table: String },
    #[error("Table {table} has an invalid value: {reason}")]
    InvalidValue { table: String, reason: String },
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Serde json parse error")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

/// Parse a JSON array of row objects, checking the required columns before trusting the rows
///
/// # Parameters
/// - `table`: Name of the table, used in error messages
/// - `json`: The table, as an array of objects keyed by column name
/// - `required`: Columns every row must have (their values may still be null)
pub(crate) fn parse_table<T: DeserializeOwned>(
    table: &str,
    json: &str,
    required: &[&str],
) -> Result<Vec<T>, TableError> {
    let rows = match serde_json::from_str::<Value>(json)? {
        Value::Array(rows) => rows,
        other => {
            return Err(TableError::InvalidValue {
                table: table.to_string(),
                reason: format!("expected an array of rows, found {}", value_kind(&other)),
            })
        }
    };
    validate_columns(table, &rows, required)?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(TableError::from))
        .collect()
}

/// Check that every row is an object holding all `required` columns
pub(crate) fn validate_columns(table: &str, rows: &[Value], required: &[&str]) -> Result<(), TableError> {
    let mut available: IndexSet<&str> = IndexSet::new();
    let mut missing: IndexSet<&str> = IndexSet::new();
    for (index, row) in rows.iter().enumerate() {
        let Value::Object(columns) = row else {
            return Err(TableError::InvalidValue {
                table: table.to_string(),
                reason: format!("row {} is {}, not an object", index, value_kind(row)),
            });
        };
        available.extend(columns.keys().map(String::as_str));
        missing.extend(required.iter().copied().filter(|c| !columns.contains_key(*c)));
    }
    if missing.is_empty() {
        return Ok(());
    }
    Err(TableError::SchemaMismatch {
        table: table.to_string(),
        missing: missing.into_iter().map(str::to_string).collect(),
        available: available.into_iter().map(str::to_string).collect(),
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Deserialize an identifier given either as a string or as a number
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(D::Error::custom(format!(
            "expected an identifier, found {}",
            value_kind(&other)
        ))),
    }
}

/// Like [`id_string`], with null for a missing identifier
pub(crate) fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(id) => Ok(Some(id)),
        Value::Number(id) => Ok(Some(id.to_string())),
        other => Err(D::Error::custom(format!(
            "expected an identifier or null, found {}",
            value_kind(&other)
        ))),
    }
}

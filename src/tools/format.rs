//! Export formatting for query results.
//!
//! Rows are serialized either as a pretty-printed JSON array or as CSV with
//! a header taken from the first row's columns.

use crate::error::{DbError, DbResult};
use crate::models::Row;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Supported export formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Render rows in this format.
    pub fn render(&self, rows: &[Row]) -> DbResult<String> {
        match self {
            Self::Json => to_json(rows),
            Self::Csv => to_csv(rows),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(DbError::validation(format!(
                "Unsupported export format '{}'. Use 'json' or 'csv'",
                s
            ))),
        }
    }
}

/// Pretty-printed JSON array of row objects. An empty result is `[]`.
pub fn to_json(rows: &[Row]) -> DbResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// CSV with a header row. An empty result is the empty string.
///
/// Fields are quoted only when they contain a delimiter, quote or line break.
/// NULL becomes an empty field; arrays and objects are written as compact JSON.
pub fn to_csv(rows: &[Row]) -> DbResult<String> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&headers).map_err(csv_error)?;
    for row in rows {
        let record = headers
            .iter()
            .map(|h| row.get(h.as_str()).map(csv_field).unwrap_or_default());
        writer.write_record(record).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DbError::internal(format!("Failed to finish CSV output: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| DbError::internal(format!("CSV output is not valid UTF-8: {}", e)))
}

fn csv_field(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}

fn csv_error(e: csv::Error) -> DbError {
    DbError::internal(format!("Failed to write CSV: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: JsonValue) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_parse_case_insensitive() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(" Csv ".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    }

    #[test]
    fn test_format_parse_rejects_unknown() {
        let err = "xml".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, DbError::Validation { .. }));
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn test_json_empty() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_json_pretty_two_space_indent() {
        let data = rows(json!([{"id": 1, "name": "Ada"}]));
        assert_eq!(
            to_json(&data).unwrap(),
            "[\n  {\n    \"id\": 1,\n    \"name\": \"Ada\"\n  }\n]"
        );
    }

    #[test]
    fn test_csv_empty() {
        assert_eq!(to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn test_csv_header_and_rows() {
        let data = rows(json!([
            {"id": 1, "name": "Ada", "active": true},
            {"id": 2, "name": "Grace", "active": false}
        ]));
        assert_eq!(
            to_csv(&data).unwrap(),
            "id,name,active\n1,Ada,true\n2,Grace,false\n"
        );
    }

    #[test]
    fn test_csv_quoting_and_nulls() {
        let data = rows(json!([
            {"id": 1, "note": "hello, world", "quote": "say \"hi\"", "missing": null},
            {"id": 2, "note": "line\nbreak", "quote": "plain", "missing": null}
        ]));
        assert_eq!(
            to_csv(&data).unwrap(),
            "id,note,quote,missing\n1,\"hello, world\",\"say \"\"hi\"\"\",\n2,\"line\nbreak\",plain,\n"
        );
    }

    #[test]
    fn test_csv_nested_json_compact() {
        let data = rows(json!([{"id": 1, "tags": {"a": [1, 2]}}]));
        assert_eq!(
            to_csv(&data).unwrap(),
            "id,tags\n1,\"{\"\"a\"\":[1,2]}\"\n"
        );
    }

    #[test]
    fn test_render_dispatch() {
        let data = rows(json!([{"x": 1}]));
        assert_eq!(ExportFormat::Csv.render(&data).unwrap(), "x\n1\n");
        assert!(ExportFormat::Json.render(&data).unwrap().starts_with('['));
    }
}

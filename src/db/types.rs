//! MySQL row to JSON conversion.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Per-category decoders handle the actual value extraction
//!
//! Text-protocol results (statements without parameters) deliver every value
//! as text, so decoders fall back to an unchecked string read when the typed
//! read fails.

use crate::models::Row as JsonRow;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    DateTime,
    Date,
    Time,
    Binary,
    Json,
    Text,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    // YEAR is reported as a small integer
    if lower.contains("int") || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "datetime" || lower == "timestamp" {
        return TypeCategory::DateTime;
    }
    if lower == "date" {
        return TypeCategory::Date;
    }
    if lower == "time" {
        return TypeCategory::Time;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bit" {
        return TypeCategory::Binary;
    }

    // varchar, char, text, enum, set, etc.
    TypeCategory::Text
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL/NUMERIC values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode binary data to a JSON string: UTF-8 text when valid, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> JsonRow;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), decode_column(self, idx, category))
            })
            .collect()
    }
}

// =============================================================================
// Decoders
// =============================================================================

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    if is_null(row, idx) {
        return JsonValue::Null;
    }
    let value = match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::DateTime => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.format(DATETIME_FORMAT).to_string())),
        TypeCategory::Date => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.format(DATE_FORMAT).to_string())),
        TypeCategory::Time => row
            .try_get::<NaiveTime, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.format(TIME_FORMAT).to_string())),
        TypeCategory::Binary => row
            .try_get::<Vec<u8>, _>(idx)
            .ok()
            .map(|v| decode_binary_value(&v)),
        TypeCategory::Json => row.try_get::<JsonValue, _>(idx).ok(),
        TypeCategory::Text => row.try_get::<String, _>(idx).ok().map(JsonValue::String),
    };

    value.unwrap_or_else(|| decode_fallback(row, idx, category))
}

fn is_null(row: &MySqlRow, idx: usize) -> bool {
    use sqlx::ValueRef;
    row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true)
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    match row.try_get::<RawDecimal, _>(idx) {
        Ok(v) => Some(JsonValue::String(v.0)),
        Err(e) => {
            tracing::debug!("Failed to decode DECIMAL: {:?}", e);
            None
        }
    }
}

fn decode_integer(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u16, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    None
}

fn decode_boolean(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    // TINYINT(1) is reported as BOOLEAN but may hold any small integer
    if let Ok(v) = row.try_get::<i8, _>(idx) {
        return Some(match v {
            0 => JsonValue::Bool(false),
            1 => JsonValue::Bool(true),
            other => JsonValue::Number(other.into()),
        });
    }
    row.try_get::<bool, _>(idx).ok().map(JsonValue::Bool)
}

fn decode_float(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Some(float_to_json(v));
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        return Some(float_to_json(v as f64));
    }
    None
}

fn float_to_json(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

/// Read the raw value as text, skipping the type compatibility check.
/// Numbers and JSON delivered as text are parsed back into their JSON form.
fn decode_fallback(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    let text = row
        .try_get_unchecked::<String, _>(idx)
        .ok()
        .or_else(|| {
            row.try_get_unchecked::<Vec<u8>, _>(idx)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        });

    let Some(text) = text else {
        tracing::debug!(column = idx, ?category, "Column could not be decoded");
        return JsonValue::Null;
    };

    match category {
        TypeCategory::Integer | TypeCategory::Float => text
            .parse::<serde_json::Number>()
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::String(text)),
        TypeCategory::Boolean => match text.as_str() {
            "0" => JsonValue::Bool(false),
            "1" => JsonValue::Bool(true),
            _ => text
                .parse::<serde_json::Number>()
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::String(text)),
        },
        TypeCategory::Json => serde_json::from_str(&text).unwrap_or(JsonValue::String(text)),
        _ => JsonValue::String(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(categorize_type("INT"), TypeCategory::Integer);
        assert_eq!(categorize_type("BIGINT UNSIGNED"), TypeCategory::Integer);
        assert_eq!(categorize_type("TINYINT"), TypeCategory::Integer);
        assert_eq!(categorize_type("YEAR"), TypeCategory::Integer);
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(categorize_type("DECIMAL"), TypeCategory::Decimal);
        assert_eq!(categorize_type("NUMERIC"), TypeCategory::Decimal);
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(categorize_type("DATETIME"), TypeCategory::DateTime);
        assert_eq!(categorize_type("TIMESTAMP"), TypeCategory::DateTime);
        assert_eq!(categorize_type("DATE"), TypeCategory::Date);
        assert_eq!(categorize_type("TIME"), TypeCategory::Time);
    }

    #[test]
    fn test_categorize_type_other() {
        assert_eq!(categorize_type("BOOLEAN"), TypeCategory::Boolean);
        assert_eq!(categorize_type("DOUBLE"), TypeCategory::Float);
        assert_eq!(categorize_type("JSON"), TypeCategory::Json);
        assert_eq!(categorize_type("VARBINARY"), TypeCategory::Binary);
        assert_eq!(categorize_type("BLOB"), TypeCategory::Binary);
        assert_eq!(categorize_type("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize_type("ENUM"), TypeCategory::Text);
    }

    #[test]
    fn test_decode_binary_value_with_valid_utf8() {
        let result = decode_binary_value(b"hello world");
        assert_eq!(result, JsonValue::String("hello world".to_string()));
    }

    #[test]
    fn test_decode_binary_value_with_invalid_utf8() {
        let bytes: &[u8] = &[0xFF, 0xFE, 0x00, 0x01];
        let result = decode_binary_value(bytes);
        assert_eq!(result, JsonValue::String("//4AAQ==".to_string()));
    }

    #[test]
    fn test_temporal_formats() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(dt.format(DATETIME_FORMAT).to_string(), "2024-03-09 14:05:00");

        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(14, 5, 0, 250_000)
            .unwrap();
        assert_eq!(
            dt.format(DATETIME_FORMAT).to_string(),
            "2024-03-09 14:05:00.250"
        );
    }
}

//! Insight log records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Name of the table backing the insight log.
pub const INSIGHTS_TABLE: &str = "data_insights";

/// A free-text analytical note persisted against a table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InsightRecord {
    pub id: i64,
    pub table_name: String,
    pub insight: String,
    /// Arbitrary JSON attached at append time, or null
    pub metadata: Option<JsonValue>,
    /// RFC 3339 creation time
    pub created_at: Option<String>,
}

/// Metadata that carries no information is stored as SQL NULL.
pub fn normalize_metadata(metadata: Option<JsonValue>) -> Option<JsonValue> {
    match metadata {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Object(map)) if map.is_empty() => None,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_metadata() {
        assert_eq!(normalize_metadata(None), None);
        assert_eq!(normalize_metadata(Some(json!(null))), None);
        assert_eq!(normalize_metadata(Some(json!({}))), None);
        assert_eq!(
            normalize_metadata(Some(json!({"source": "q3"}))),
            Some(json!({"source": "q3"}))
        );
        assert_eq!(normalize_metadata(Some(json!([1, 2]))), Some(json!([1, 2])));
    }
}

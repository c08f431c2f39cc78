//! Schema description models as reported by `DESCRIBE` and `SHOW INDEX`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One row of `DESCRIBE <table>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub field: String,
    /// Full column type, e.g. "varchar(255)" or "int unsigned"
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    /// PRI, UNI or MUL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub default: Option<String>,
    /// e.g. "auto_increment"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl ColumnInfo {
    pub fn new(field: impl Into<String>, column_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            field: field.into(),
            column_type: column_type.into(),
            nullable,
            key: None,
            default: None,
            extra: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.key.as_deref() == Some("PRI")
    }
}

/// One row of `SHOW INDEX FROM <table>`: a single column of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndexInfo {
    pub index_name: String,
    /// None for functional key parts
    pub column_name: Option<String>,
    pub unique: bool,
    /// 1-based position of the column within the index
    pub seq_in_index: u64,
    /// BTREE, HASH, FULLTEXT, SPATIAL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_type: Option<String>,
}

impl IndexInfo {
    pub fn new(index_name: impl Into<String>, column_name: Option<String>) -> Self {
        Self {
            index_name: index_name.into(),
            column_name,
            unique: false,
            seq_in_index: 1,
            index_type: None,
        }
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn with_seq_in_index(mut self, seq: u64) -> Self {
        self.seq_in_index = seq;
        self
    }

    pub fn with_index_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = Some(index_type.into());
        self
    }

    pub fn is_primary(&self) -> bool {
        self.index_name == "PRIMARY"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_info_serialization() {
        let col = ColumnInfo::new("id", "int", false)
            .with_key("PRI")
            .with_extra("auto_increment");
        assert!(col.is_primary_key());

        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], "int");
        assert_eq!(json["default"], serde_json::Value::Null);
        assert_eq!(json["extra"], "auto_increment");
    }

    #[test]
    fn test_column_info_skips_empty_key() {
        let col = ColumnInfo::new("name", "varchar(255)", true);
        let json = serde_json::to_value(&col).unwrap();
        assert!(json.get("key").is_none());
        assert!(!col.is_primary_key());
    }

    #[test]
    fn test_index_info_primary() {
        let idx = IndexInfo::new("PRIMARY", Some("id".to_string()))
            .with_unique(true)
            .with_index_type("BTREE");
        assert!(idx.is_primary());
        assert_eq!(idx.seq_in_index, 1);
    }
}

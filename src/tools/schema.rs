//! Schema introspection tools.
//!
//! This module implements the `list_tables` and `describe_table` tools.

use crate::db::{ConnectionProvider, QueryExecutor, SchemaInspector};
use crate::error::DbResult;
use crate::models::descriptor::require_identifier;
use crate::models::{ColumnInfo, IndexInfo};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the list_tables tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Schema (database) to list. Omit for the connection's current database.
    #[serde(default)]
    pub schema: Option<String>,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub tables: Vec<String>,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe
    pub table_name: String,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub table_name: String,
    /// One entry per column, as reported by DESCRIBE
    pub structure: Vec<ColumnInfo>,
    /// One entry per indexed column, as reported by SHOW INDEX
    pub indexes: Vec<IndexInfo>,
}

pub struct SchemaToolHandler {
    provider: Arc<ConnectionProvider>,
    inspector: SchemaInspector,
}

impl SchemaToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        let inspector = SchemaInspector::new(QueryExecutor::new(provider.query_timeout()));
        Self {
            provider,
            inspector,
        }
    }

    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        let schema = input.schema.filter(|s| !s.trim().is_empty());

        let mut conn = self.provider.acquire().await?;
        let tables = self
            .inspector
            .list_tables(&mut conn, schema.as_deref())
            .await?;

        info!(
            schema = ?schema,
            count = tables.len(),
            "Listed tables"
        );

        Ok(ListTablesOutput { tables })
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<DescribeTableOutput> {
        require_identifier("table_name", &input.table_name)?;

        let mut conn = self.provider.acquire().await?;
        let structure = self
            .inspector
            .describe_columns(&mut conn, &input.table_name)
            .await?;
        let indexes = self
            .inspector
            .describe_indexes(&mut conn, &input.table_name)
            .await?;

        info!(
            table = %input.table_name,
            columns = structure.len(),
            indexes = indexes.len(),
            "Described table"
        );

        Ok(DescribeTableOutput {
            table_name: input.table_name,
            structure,
            indexes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_tables_input_defaults() {
        let input: ListTablesInput = serde_json::from_str("{}").unwrap();
        assert!(input.schema.is_none());

        let input: ListTablesInput = serde_json::from_str(r#"{"schema": "shop"}"#).unwrap();
        assert_eq!(input.schema.as_deref(), Some("shop"));
    }

    #[test]
    fn test_describe_table_output_serialization() {
        let output = DescribeTableOutput {
            table_name: "users".to_string(),
            structure: vec![
                ColumnInfo::new("id", "int", false)
                    .with_key("PRI")
                    .with_extra("auto_increment"),
                ColumnInfo::new("email", "varchar(255)", true),
            ],
            indexes: vec![IndexInfo::new("PRIMARY", Some("id".to_string())).with_unique(true)],
        };

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["table_name"], "users");
        assert_eq!(json["structure"][0]["field"], "id");
        assert_eq!(json["structure"][0]["type"], "int");
        assert_eq!(json["structure"][0]["key"], "PRI");
        assert_eq!(json["structure"][1]["nullable"], true);
        assert_eq!(json["indexes"][0]["index_name"], "PRIMARY");
        assert_eq!(json["indexes"][0]["unique"], true);
    }
}

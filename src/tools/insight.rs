//! Insight log tools.
//!
//! This module implements `append_insight` and `list_insights`. Insights are
//! free-text notes keyed by table name and stored in their own table, which
//! is created on first append.

use crate::db::types::DATETIME_FORMAT;
use crate::db::{ConnectionProvider, QueryExecutor, quote_identifier};
use crate::error::{DbError, DbResult};
use crate::models::descriptor::require_identifier;
use crate::models::insight::normalize_metadata;
use crate::models::{INSIGHTS_TABLE, InsightRecord, QueryParam, Row};
use crate::tools::write::finish;
use chrono::{NaiveDateTime, SecondsFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::Connection;
use std::sync::Arc;
use tracing::info;

/// Input for the append_insight tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AppendInsightInput {
    /// Table the insight is about
    pub table_name: String,
    /// The insight text
    pub insight: String,
    /// Optional structured context stored alongside the insight
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// Output from the append_insight tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AppendInsightOutput {
    pub table_name: String,
    /// Id of the stored insight
    pub insight_id: u64,
}

/// Input for the list_insights tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListInsightsInput {
    /// Only return insights for this table. Omit for all insights.
    #[serde(default)]
    pub table_name: Option<String>,
}

/// Output from the list_insights tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListInsightsOutput {
    /// Newest first
    pub insights: Vec<InsightRecord>,
    pub count: usize,
}

fn create_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
         id INT AUTO_INCREMENT PRIMARY KEY, \
         table_name VARCHAR(255) NOT NULL, \
         insight TEXT NOT NULL, \
         metadata JSON, \
         created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
         INDEX (table_name))",
        quote_identifier(INSIGHTS_TABLE)
    )
}

fn insert_sql() -> String {
    format!(
        "INSERT INTO {} (table_name, insight, metadata) VALUES (?, ?, ?)",
        quote_identifier(INSIGHTS_TABLE)
    )
}

fn select_sql(filtered: bool) -> String {
    let filter = if filtered { " WHERE table_name = ?" } else { "" };
    format!(
        "SELECT id, table_name, insight, metadata, created_at FROM {}{} ORDER BY created_at DESC, id DESC",
        quote_identifier(INSIGHTS_TABLE),
        filter
    )
}

pub struct InsightToolHandler {
    provider: Arc<ConnectionProvider>,
    executor: QueryExecutor,
}

impl InsightToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        let executor = QueryExecutor::new(provider.query_timeout());
        Self { provider, executor }
    }

    pub async fn append_insight(&self, input: AppendInsightInput) -> DbResult<AppendInsightOutput> {
        require_identifier("table_name", &input.table_name)?;
        if input.insight.trim().is_empty() {
            return Err(DbError::validation("insight must not be empty"));
        }

        let params = vec![
            QueryParam::String(input.table_name.clone()),
            QueryParam::String(input.insight),
            normalize_metadata(input.metadata)
                .map(QueryParam::Json)
                .unwrap_or(QueryParam::Null),
        ];

        let mut conn = self.provider.acquire().await?;
        self.executor
            .execute(&mut conn, &create_table_sql(), &[])
            .await?;

        let mut tx = conn.begin().await?;
        let outcome = self.executor.execute(&mut tx, &insert_sql(), &params).await;
        let outcome = finish(tx, outcome).await?;

        let insight_id = outcome
            .last_insert_id
            .ok_or_else(|| DbError::internal("Insert did not report a generated insight id"))?;

        info!(table = %input.table_name, insight_id, "Appended insight");

        Ok(AppendInsightOutput {
            table_name: input.table_name,
            insight_id,
        })
    }

    pub async fn list_insights(&self, input: ListInsightsInput) -> DbResult<ListInsightsOutput> {
        let table_name = input.table_name.filter(|t| !t.is_empty());
        let params: Vec<QueryParam> = table_name.iter().cloned().map(QueryParam::String).collect();

        let mut conn = self.provider.acquire().await?;
        let rows = self
            .executor
            .fetch_json(&mut conn, &select_sql(table_name.is_some()), &params)
            .await?;

        let insights = rows
            .into_iter()
            .map(record_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        info!(table = ?table_name, count = insights.len(), "Listed insights");

        Ok(ListInsightsOutput {
            count: insights.len(),
            insights,
        })
    }
}

fn record_from_row(mut row: Row) -> DbResult<InsightRecord> {
    let id = row
        .get("id")
        .and_then(JsonValue::as_i64)
        .ok_or_else(|| DbError::internal("Insight row is missing its id"))?;

    let mut take_string = |column: &str| match row.remove(column) {
        Some(JsonValue::String(s)) => Some(s),
        _ => None,
    };
    let table_name = take_string("table_name").unwrap_or_default();
    let insight = take_string("insight").unwrap_or_default();
    let created_at = take_string("created_at").map(|s| to_rfc3339(&s));

    // Already decoded by the row mapper; a string here is a JSON string value
    let metadata = row.remove("metadata").filter(|v| !v.is_null());

    Ok(InsightRecord {
        id,
        table_name,
        insight,
        metadata,
        created_at,
    })
}

/// Server timestamps are UTC (the driver sets the session time zone).
fn to_rfc3339(timestamp: &str) -> String {
    NaiveDateTime::parse_from_str(timestamp, DATETIME_FORMAT)
        .map(|dt| dt.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|_| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            create_table_sql(),
            "CREATE TABLE IF NOT EXISTS `data_insights` (id INT AUTO_INCREMENT PRIMARY KEY, \
             table_name VARCHAR(255) NOT NULL, insight TEXT NOT NULL, metadata JSON, \
             created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, INDEX (table_name))"
        );
    }

    #[test]
    fn test_select_sql() {
        assert_eq!(
            select_sql(false),
            "SELECT id, table_name, insight, metadata, created_at FROM `data_insights` ORDER BY created_at DESC, id DESC"
        );
        assert!(select_sql(true).contains("WHERE table_name = ? ORDER BY"));
    }

    #[test]
    fn test_record_from_row() {
        let row: Row = serde_json::from_value(json!({
            "id": 3,
            "table_name": "orders",
            "insight": "Revenue doubled in Q3",
            "metadata": {"source": "dashboard"},
            "created_at": "2024-10-01 12:30:00"
        }))
        .unwrap();

        let record = record_from_row(row).unwrap();
        assert_eq!(record.id, 3);
        assert_eq!(record.table_name, "orders");
        assert_eq!(record.metadata, Some(json!({"source": "dashboard"})));
        assert_eq!(record.created_at.as_deref(), Some("2024-10-01T12:30:00Z"));
    }

    #[test]
    fn test_record_from_row_string_metadata_and_nulls() {
        let row: Row = serde_json::from_value(json!({
            "id": 4,
            "table_name": "orders",
            "insight": "note",
            "metadata": "42",
            "created_at": null
        }))
        .unwrap();

        let record = record_from_row(row).unwrap();
        assert_eq!(record.metadata, Some(json!("42")));
        assert!(record.created_at.is_none());
    }

    #[test]
    fn test_record_from_row_keeps_encoded_object_string() {
        let row: Row = serde_json::from_value(json!({
            "id": 5,
            "table_name": "orders",
            "insight": "note",
            "metadata": "{\"a\":1}"
        }))
        .unwrap();

        let record = record_from_row(row).unwrap();
        assert_eq!(record.metadata, Some(json!("{\"a\":1}")));
    }

    #[test]
    fn test_append_input_metadata_optional() {
        let input: AppendInsightInput = serde_json::from_value(json!({
            "table_name": "orders",
            "insight": "Spike on Mondays"
        }))
        .unwrap();
        assert!(input.metadata.is_none());
    }
}

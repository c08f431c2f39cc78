//! Read query tool.
//!
//! This module implements the `read_query` tool for SELECT-style statements.
//! Statements that modify data or schema are refused before a connection is
//! acquired.

use crate::db::{ConnectionProvider, QueryExecutor, resolve_params};
use crate::error::DbResult;
use crate::models::{QueryParams, Row};
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the read_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadQueryInput {
    /// SQL SELECT statement. Use ? placeholders with a params array, or :name placeholders with a params object.
    pub query: String,
    /// Values bound to the placeholders. Never interpolated into the SQL text.
    #[serde(default)]
    pub params: Option<QueryParams>,
}

/// Output from the read_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ReadQueryOutput {
    /// Result rows as column name to value maps, in column order
    pub results: Vec<Row>,
    pub row_count: usize,
}

impl From<Vec<Row>> for ReadQueryOutput {
    fn from(results: Vec<Row>) -> Self {
        Self {
            row_count: results.len(),
            results,
        }
    }
}

pub struct QueryToolHandler {
    provider: Arc<ConnectionProvider>,
    executor: QueryExecutor,
}

impl QueryToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        let executor = QueryExecutor::new(provider.query_timeout());
        Self { provider, executor }
    }

    pub async fn read_query(&self, input: ReadQueryInput) -> DbResult<ReadQueryOutput> {
        let rows = self
            .fetch_read_only("read_query", &input.query, input.params.as_ref())
            .await?;

        info!(row_count = rows.len(), "Read query executed");

        Ok(ReadQueryOutput::from(rows))
    }

    /// Validate, bind and run a read-only statement. Shared with the export tool.
    pub(crate) async fn fetch_read_only(
        &self,
        tool: &str,
        query: &str,
        params: Option<&QueryParams>,
    ) -> DbResult<Vec<Row>> {
        let (sql, bound) = resolve_params(query, params)?;
        sql_validator::ensure_read_only(&sql, tool)?;

        let mut conn = self.provider.acquire().await?;
        self.executor.fetch_json(&mut conn, &sql, &bound).await
    }
}

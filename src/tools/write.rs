//! Write operation tool.
//!
//! This module implements the `write_query` tool for INSERT, UPDATE and
//! DELETE statements. Each call runs in its own transaction: committed on
//! success, rolled back on failure.

use crate::db::{ConnectionProvider, QueryExecutor, WriteOutcome, resolve_params};
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryParams};
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{Connection, MySql, Transaction};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the write_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WriteQueryInput {
    /// SQL INSERT, UPDATE or DELETE statement. Use ? or :name placeholders for values.
    pub query: String,
    /// Values bound to the placeholders. Never interpolated into the SQL text.
    #[serde(default)]
    pub params: Option<QueryParams>,
}

/// Output from the write_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WriteQueryOutput {
    /// Number of rows affected by the statement
    pub affected_rows: u64,
    /// Auto-increment id generated by the statement, null if none
    pub lastrowid: Option<u64>,
}

impl From<WriteOutcome> for WriteQueryOutput {
    fn from(outcome: WriteOutcome) -> Self {
        Self {
            affected_rows: outcome.affected_rows,
            lastrowid: outcome.last_insert_id,
        }
    }
}

pub struct WriteToolHandler {
    provider: Arc<ConnectionProvider>,
    executor: QueryExecutor,
}

impl WriteToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        let executor = QueryExecutor::new(provider.query_timeout());
        Self { provider, executor }
    }

    pub async fn write_query(&self, input: WriteQueryInput) -> DbResult<WriteQueryOutput> {
        let (sql, bound) = resolve_params(&input.query, input.params.as_ref())?;
        sql_validator::ensure_not_read_only(&sql, "write_query")?;

        let mut conn = self.provider.acquire().await?;
        let mut tx = conn.begin().await?;

        let outcome = self.execute_in(&mut tx, &sql, &bound).await;
        let outcome = finish(tx, outcome).await?;

        info!(
            affected_rows = outcome.affected_rows,
            last_insert_id = ?outcome.last_insert_id,
            "Write query committed"
        );

        Ok(outcome.into())
    }

    async fn execute_in(
        &self,
        tx: &mut Transaction<'_, MySql>,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<WriteOutcome> {
        self.executor.execute(tx, sql, params).await
    }
}

/// Commit on success, roll back on failure.
///
/// A failed rollback is logged and the original error is reported.
pub(crate) async fn finish<T>(tx: Transaction<'_, MySql>, result: DbResult<T>) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(DbError::from)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

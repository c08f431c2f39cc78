//! Query execution engine.
//!
//! Statements run on a caller-supplied connection so that the tool layer
//! controls the connection lifecycle and transaction scope. Every call is
//! bounded by the configured query timeout.
//!
//! When no parameters are bound the statement is sent over the text protocol;
//! some statements (DDL, `SHOW ...`) cannot be prepared.

use crate::db::params::bind_param;
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, Row};
use sqlx::MySqlConnection;
use sqlx::mysql::{MySqlQueryResult, MySqlRow};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Result of a data-modifying statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub affected_rows: u64,
    /// `None` when the statement generated no auto-increment value.
    pub last_insert_id: Option<u64>,
}

impl From<MySqlQueryResult> for WriteOutcome {
    fn from(result: MySqlQueryResult) -> Self {
        let id = result.last_insert_id();
        Self {
            affected_rows: result.rows_affected(),
            last_insert_id: (id != 0).then_some(id),
        }
    }
}

/// Query executor that handles statement execution.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    default_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run a row-returning statement and fetch every row.
    pub async fn fetch_rows(
        &self,
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<Vec<MySqlRow>> {
        debug!(
            sql = %sql,
            params = params.len(),
            timeout_secs = self.default_timeout.as_secs(),
            "Executing query"
        );

        let rows_future = async {
            if params.is_empty() {
                use sqlx::Executor;
                conn.fetch_all(sql).await
            } else {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_param(query, param);
                }
                query.fetch_all(&mut *conn).await
            }
        };

        match timeout(self.default_timeout, rows_future).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(self.timeout_error("query execution")),
        }
    }

    /// Run a row-returning statement and convert every row to a JSON object.
    pub async fn fetch_json(
        &self,
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<Vec<Row>> {
        let rows = self.fetch_rows(conn, sql, params).await?;
        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    /// Run a statement that does not return rows.
    pub async fn execute(
        &self,
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<WriteOutcome> {
        debug!(
            sql = %sql,
            params = params.len(),
            timeout_secs = self.default_timeout.as_secs(),
            "Executing statement"
        );

        let exec_future = async {
            if params.is_empty() {
                use sqlx::Executor;
                conn.execute(sql).await
            } else {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_param(query, param);
                }
                query.execute(&mut *conn).await
            }
        };

        match timeout(self.default_timeout, exec_future).await {
            Ok(Ok(result)) => Ok(WriteOutcome::from(result)),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(self.timeout_error("statement execution")),
        }
    }

    fn timeout_error(&self, operation: &str) -> DbError {
        DbError::timeout(operation, self.default_timeout.as_secs() as u32)
    }
}

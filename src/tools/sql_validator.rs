//! SQL statement classification for the data tools.
//!
//! `read_query` and `export_query` only run statements that read
//! (SELECT, SHOW, DESCRIBE, EXPLAIN of a read). `write_query` refuses
//! statements that only read, pointing the caller at `read_query`.
//!
//! Uses [sqlparser](https://docs.rs/sqlparser/) with the MySQL dialect so
//! formatting tricks cannot disguise a write as a read. SQL the parser does
//! not understand is passed to the server unchanged; the server remains the
//! authority on what is valid.

use crate::error::{DbError, DbResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

/// Whether a parsed statement reads or modifies data/schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

/// Reject statements that modify data or schema.
///
/// # Examples
///
/// ```
/// use sql_agent_mcp::tools::sql_validator::ensure_read_only;
///
/// assert!(ensure_read_only("SELECT * FROM users", "read_query").is_ok());
/// assert!(ensure_read_only("DELETE FROM users", "read_query").is_err());
/// ```
pub fn ensure_read_only(sql: &str, tool: &str) -> DbResult<()> {
    let Some(statements) = classify(sql)? else {
        return Ok(());
    };

    if let Some((_, label)) = statements.iter().find(|(k, _)| *k == StatementKind::Write) {
        return Err(DbError::validation(format!(
            "{} statements are not allowed in {}. Use write_query or the table tools.",
            label, tool
        )));
    }
    Ok(())
}

/// Reject statements that only read; those belong in `read_query`.
pub fn ensure_not_read_only(sql: &str, tool: &str) -> DbResult<()> {
    let Some(statements) = classify(sql)? else {
        return Ok(());
    };

    if !statements.is_empty() && statements.iter().all(|(k, _)| *k == StatementKind::Read) {
        return Err(DbError::validation(format!(
            "{} statements are not allowed in {}. Use read_query.",
            statements[0].1, tool
        )));
    }
    Ok(())
}

/// Parse and classify every statement in `sql`.
///
/// Returns `Ok(None)` when the text does not parse.
fn classify(sql: &str) -> DbResult<Option<Vec<(StatementKind, String)>>> {
    if sql.trim().is_empty() {
        return Err(DbError::validation("Query must not be empty"));
    }

    match Parser::parse_sql(&MySqlDialect {}, sql) {
        Ok(statements) => Ok(Some(statements.iter().map(classify_statement).collect())),
        Err(e) => {
            debug!(error = %e, "SQL not parsed; passing through to server");
            Ok(None)
        }
    }
}

/// Classify a parsed statement.
fn classify_statement(stmt: &Statement) -> (StatementKind, String) {
    let read = |label: &str| (StatementKind::Read, label.to_string());

    match stmt {
        Statement::Query(_) => read("SELECT"),
        Statement::ShowTables { .. } => read("SHOW TABLES"),
        Statement::ShowColumns { .. } => read("SHOW COLUMNS"),
        Statement::ShowDatabases { .. } => read("SHOW DATABASES"),
        Statement::ShowSchemas { .. } => read("SHOW SCHEMAS"),
        Statement::ShowCreate { .. } => read("SHOW CREATE"),
        Statement::ShowFunctions { .. } => read("SHOW FUNCTIONS"),
        Statement::ShowVariable { .. } => read("SHOW VARIABLE"),
        Statement::ShowVariables { .. } => read("SHOW VARIABLES"),
        Statement::ShowStatus { .. } => read("SHOW STATUS"),
        Statement::ShowCollation { .. } => read("SHOW COLLATION"),
        Statement::ExplainTable { .. } => read("DESCRIBE"),

        // EXPLAIN inherits the kind of the statement it explains
        Statement::Explain { statement, .. } => match classify_statement(statement) {
            (StatementKind::Read, _) => read("EXPLAIN"),
            write => write,
        },

        other => (StatementKind::Write, statement_label(other)),
    }
}

/// Leading keyword of a statement, e.g. "INSERT" or "DROP".
fn statement_label(stmt: &Statement) -> String {
    stmt.to_string()
        .split_whitespace()
        .next()
        .unwrap_or("Unknown")
        .to_uppercase()
}

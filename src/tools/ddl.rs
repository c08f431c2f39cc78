//! Table DDL tools.
//!
//! This module implements `create_table`, `alter_table` and `drop_table`.
//! Statements are built from structured descriptors; identifiers are always
//! backtick-quoted and descriptors are validated before a connection is
//! acquired.
//!
//! MySQL commits DDL implicitly, so an `alter_table` batch is applied as one
//! multi-clause `ALTER TABLE` statement. The server applies such a statement
//! atomically: if any clause fails, none take effect.
//!
//! Clauses of one statement all see the table as it was before the statement,
//! so a batch may not touch a column that an earlier step in the same batch
//! added or dropped. Such batches are rejected up front and must be split
//! into separate calls.

use crate::db::{ConnectionProvider, QueryExecutor, quote_identifier};
use crate::error::{DbError, DbResult};
use crate::models::descriptor::require_identifier;
use crate::models::{Alteration, AlterationInput, ColumnDescriptor};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

fn default_if_exists() -> bool {
    true
}

/// Input for the create_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateTableInput {
    /// Name of the table to create
    pub table_name: String,
    /// Column definitions, in order
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    /// Table-level constraints, e.g. "UNIQUE (email)" or "FOREIGN KEY (user_id) REFERENCES users(id)"
    #[serde(default)]
    pub constraints: Option<Vec<String>>,
}

/// Input for the alter_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AlterTableInput {
    /// Name of the table to alter
    pub table_name: String,
    /// Alterations applied in order, all or nothing
    #[serde(default)]
    pub alterations: Vec<AlterationInput>,
}

/// Input for the drop_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DropTableInput {
    /// Name of the table to drop
    pub table_name: String,
    /// Do not fail when the table does not exist. Default: true
    #[serde(default = "default_if_exists")]
    pub if_exists: bool,
}

/// Output from create_table and drop_table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableStatementOutput {
    pub table_name: String,
    /// The exact SQL that was executed
    pub sql: String,
}

/// Output from the alter_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AlterTableOutput {
    pub table_name: String,
    /// One ALTER TABLE statement per alteration, in order
    pub alterations: Vec<String>,
}

// =============================================================================
// Statement builders
// =============================================================================

fn column_definition(name: &str, data_type: &str, constraints: Option<&str>) -> String {
    let mut def = format!("{} {}", quote_identifier(name), data_type.trim());
    if let Some(c) = constraints.map(str::trim).filter(|c| !c.is_empty()) {
        def.push(' ');
        def.push_str(c);
    }
    def
}

/// Build a `CREATE TABLE` statement after validating every descriptor.
pub fn build_create_table(input: &CreateTableInput) -> DbResult<String> {
    require_identifier("table_name", &input.table_name)?;
    if input.columns.is_empty() {
        return Err(DbError::validation("At least one column is required"));
    }

    let mut definitions = Vec::with_capacity(input.columns.len());
    for column in &input.columns {
        let data_type = column.checked_type()?;
        definitions.push(column_definition(
            &column.name,
            data_type,
            column.constraints.as_deref(),
        ));
    }

    for constraint in input.constraints.iter().flatten() {
        if constraint.contains(';') {
            return Err(DbError::validation(format!(
                "table constraint must not contain ';': {}",
                constraint
            )));
        }
        let constraint = constraint.trim();
        if !constraint.is_empty() {
            definitions.push(constraint.to_string());
        }
    }

    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_identifier(&input.table_name),
        definitions.join(", ")
    ))
}

/// The clause of an `ALTER TABLE` statement for one alteration.
fn alteration_clause(alteration: &Alteration) -> String {
    match alteration {
        Alteration::AddColumn {
            name,
            data_type,
            constraints,
        }
        | Alteration::ModifyColumn {
            name,
            data_type,
            constraints,
        } => format!(
            "{} {}",
            alteration.action_name(),
            column_definition(name, data_type, constraints.as_deref())
        ),
        Alteration::DropColumn { name } => {
            format!("{} {}", alteration.action_name(), quote_identifier(name))
        }
        Alteration::RenameTo { new_name } => {
            format!("{} {}", alteration.action_name(), quote_identifier(new_name))
        }
    }
}

/// A validated `alter_table` batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterPlan {
    /// One standalone statement per alteration, reported back to the caller
    pub statements: Vec<String>,
    /// The single statement actually executed
    pub combined: String,
}

/// Validate every alteration and build the per-step and combined statements.
pub fn build_alter_table(input: &AlterTableInput) -> DbResult<AlterPlan> {
    require_identifier("table_name", &input.table_name)?;
    if input.alterations.is_empty() {
        return Err(DbError::validation("At least one alteration is required"));
    }

    let alterations = input
        .alterations
        .iter()
        .cloned()
        .map(Alteration::try_from)
        .collect::<DbResult<Vec<_>>>()?;
    check_batch_order(&alterations)?;

    let table = quote_identifier(&input.table_name);
    let clauses: Vec<String> = alterations.iter().map(alteration_clause).collect();

    Ok(AlterPlan {
        statements: clauses
            .iter()
            .map(|clause| format!("ALTER TABLE {} {}", table, clause))
            .collect(),
        combined: format!("ALTER TABLE {} {}", table, clauses.join(", ")),
    })
}

/// Reject a step that depends on a column added or dropped earlier in the
/// same batch. Column names compare case-insensitively, as in MySQL.
fn check_batch_order(alterations: &[Alteration]) -> DbResult<()> {
    let mut changed: HashMap<String, &'static str> = HashMap::new();

    for (step, alteration) in alterations.iter().enumerate() {
        let name = match alteration {
            Alteration::AddColumn { name, .. }
            | Alteration::ModifyColumn { name, .. }
            | Alteration::DropColumn { name } => name,
            Alteration::RenameTo { .. } => continue,
        };
        let key = name.to_lowercase();

        if let Some(earlier) = changed.get(&key) {
            return Err(DbError::validation(format!(
                "Alteration {} ({} `{}`) depends on an earlier {} of the same column. \
                 Split these into separate alter_table calls",
                step + 1,
                alteration.action_name(),
                name,
                earlier
            )));
        }

        if let Alteration::AddColumn { .. } | Alteration::DropColumn { .. } = alteration {
            changed.insert(key, alteration.action_name());
        }
    }
    Ok(())
}

/// Build a `DROP TABLE` statement.
pub fn build_drop_table(input: &DropTableInput) -> DbResult<String> {
    require_identifier("table_name", &input.table_name)?;
    let if_exists = if input.if_exists { "IF EXISTS " } else { "" };
    Ok(format!(
        "DROP TABLE {}{}",
        if_exists,
        quote_identifier(&input.table_name)
    ))
}

// =============================================================================
// Handler
// =============================================================================

pub struct DdlToolHandler {
    provider: Arc<ConnectionProvider>,
    executor: QueryExecutor,
}

impl DdlToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        let executor = QueryExecutor::new(provider.query_timeout());
        Self { provider, executor }
    }

    pub async fn create_table(&self, input: CreateTableInput) -> DbResult<TableStatementOutput> {
        let sql = build_create_table(&input)?;
        self.run(&sql).await?;

        info!(table = %input.table_name, columns = input.columns.len(), "Created table");

        Ok(TableStatementOutput {
            table_name: input.table_name,
            sql,
        })
    }

    pub async fn alter_table(&self, input: AlterTableInput) -> DbResult<AlterTableOutput> {
        let plan = build_alter_table(&input)?;
        self.run(&plan.combined).await?;

        info!(
            table = %input.table_name,
            alterations = plan.statements.len(),
            "Altered table"
        );

        Ok(AlterTableOutput {
            table_name: input.table_name,
            alterations: plan.statements,
        })
    }

    pub async fn drop_table(&self, input: DropTableInput) -> DbResult<TableStatementOutput> {
        let sql = build_drop_table(&input)?;
        self.run(&sql).await?;

        info!(table = %input.table_name, if_exists = input.if_exists, "Dropped table");

        Ok(TableStatementOutput {
            table_name: input.table_name,
            sql,
        })
    }

    async fn run(&self, sql: &str) -> DbResult<()> {
        let mut conn = self.provider.acquire().await?;
        self.executor.execute(&mut conn, sql, &[]).await?;
        Ok(())
    }
}

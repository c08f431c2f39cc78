//! MCP service implementation using rmcp.
//!
//! This module defines the SqlAgentService struct with all database tools
//! exposed via the MCP protocol using the rmcp framework's macros.
//!
//! Every tool returns a [`ToolResponse`] envelope. Failures are logged here
//! and reported as `success: false`; no tool call surfaces as a protocol
//! error.

use crate::db::ConnectionProvider;
use crate::error::DbResult;
use crate::models::ToolResponse;
use crate::tools::{
    AlterTableInput, AlterTableOutput, AppendInsightInput, AppendInsightOutput, CreateTableInput,
    DdlToolHandler, DescribeTableInput, DescribeTableOutput, DropTableInput, ExportQueryInput,
    ExportQueryOutput, ExportToolHandler, InsightToolHandler, ListInsightsInput,
    ListInsightsOutput, ListTablesInput, ListTablesOutput, QueryToolHandler, ReadQueryInput,
    ReadQueryOutput, SchemaToolHandler, TableStatementOutput, WriteQueryInput, WriteQueryOutput,
    WriteToolHandler,
};
use rmcp::Json;
use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct SqlAgentService {
    /// Shared connection provider for all database operations
    provider: Arc<ConnectionProvider>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl SqlAgentService {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self {
            provider,
            tool_router: Self::tool_router(),
        }
    }

    pub fn provider(&self) -> &Arc<ConnectionProvider> {
        &self.provider
    }
}

/// Wrap a handler result in the response envelope, logging failures.
fn respond<T>(operation: &str, result: DbResult<T>) -> Json<ToolResponse<T>> {
    if let Err(e) = &result {
        error!(operation, kind = e.kind(), error = %e, "Tool operation failed");
    }
    Json(ToolResponse::from_result(result))
}

#[tool_router]
impl SqlAgentService {
    #[tool(
        description = "List tables in the current database.\nPass `schema` to list the tables of another database on the same server."
    )]
    pub async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Json<ToolResponse<ListTablesOutput>> {
        let handler = SchemaToolHandler::new(self.provider.clone());
        respond("list_tables", handler.list_tables(input).await)
    }

    #[tool(
        description = "Describe a table.\nReturns one entry per column (field, type, nullable, key, default, extra) and one entry per indexed column (index_name, column_name, unique, seq_in_index, index_type)."
    )]
    pub async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Json<ToolResponse<DescribeTableOutput>> {
        let handler = SchemaToolHandler::new(self.provider.clone());
        respond("describe_table", handler.describe_table(input).await)
    }

    #[tool(
        description = "Run a SELECT query and return the rows.\nValues go in `params`: an array for ? placeholders or an object for :name placeholders.\nStatements that modify data or schema are refused; use write_query or the table tools."
    )]
    pub async fn read_query(
        &self,
        Parameters(input): Parameters<ReadQueryInput>,
    ) -> Json<ToolResponse<ReadQueryOutput>> {
        let handler = QueryToolHandler::new(self.provider.clone());
        respond("read_query", handler.read_query(input).await)
    }

    #[tool(
        description = "Run an INSERT, UPDATE or DELETE statement in its own transaction.\nCommits on success and rolls back on failure.\nReturns affected_rows and lastrowid (null when no id was generated)."
    )]
    pub async fn write_query(
        &self,
        Parameters(input): Parameters<WriteQueryInput>,
    ) -> Json<ToolResponse<WriteQueryOutput>> {
        let handler = WriteToolHandler::new(self.provider.clone());
        respond("write_query", handler.write_query(input).await)
    }

    #[tool(
        description = "Create a table from column descriptors {name, type, constraints?} and optional table-level constraints.\nReturns the exact SQL executed."
    )]
    pub async fn create_table(
        &self,
        Parameters(input): Parameters<CreateTableInput>,
    ) -> Json<ToolResponse<TableStatementOutput>> {
        let handler = DdlToolHandler::new(self.provider.clone());
        respond("create_table", handler.create_table(input).await)
    }

    #[tool(
        description = "Alter a table with a list of alterations, applied all or nothing.\nActions: ADD_COLUMN and MODIFY_COLUMN (name, type, constraints?), DROP_COLUMN (name), RENAME_TO (new_name).\nReturns one ALTER TABLE statement per alteration."
    )]
    pub async fn alter_table(
        &self,
        Parameters(input): Parameters<AlterTableInput>,
    ) -> Json<ToolResponse<AlterTableOutput>> {
        let handler = DdlToolHandler::new(self.provider.clone());
        respond("alter_table", handler.alter_table(input).await)
    }

    #[tool(
        description = "Drop a table.\nWith if_exists (default true) dropping a missing table succeeds."
    )]
    pub async fn drop_table(
        &self,
        Parameters(input): Parameters<DropTableInput>,
    ) -> Json<ToolResponse<TableStatementOutput>> {
        let handler = DdlToolHandler::new(self.provider.clone());
        respond("drop_table", handler.drop_table(input).await)
    }

    #[tool(
        description = "Run a SELECT query and export the rows as `json` (default, pretty-printed array) or `csv` (header row from the first row's columns)."
    )]
    pub async fn export_query(
        &self,
        Parameters(input): Parameters<ExportQueryInput>,
    ) -> Json<ToolResponse<ExportQueryOutput>> {
        let handler = ExportToolHandler::new(self.provider.clone());
        respond("export_query", handler.export_query(input).await)
    }

    #[tool(
        description = "Record an analytical insight about a table, with optional JSON metadata.\nThe insight log table is created on first use."
    )]
    pub async fn append_insight(
        &self,
        Parameters(input): Parameters<AppendInsightInput>,
    ) -> Json<ToolResponse<AppendInsightOutput>> {
        let handler = InsightToolHandler::new(self.provider.clone());
        respond("append_insight", handler.append_insight(input).await)
    }

    #[tool(description = "List recorded insights, newest first.\nPass `table_name` to filter.")]
    pub async fn list_insights(
        &self,
        Parameters(input): Parameters<ListInsightsInput>,
    ) -> Json<ToolResponse<ListInsightsOutput>> {
        let handler = InsightToolHandler::new(self.provider.clone());
        respond("list_insights", handler.list_insights(input).await)
    }
}

#[tool_handler]
impl ServerHandler for SqlAgentService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "sql-agent-mcp".to_owned(),
                title: Some("SQL Agent MCP".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MySQL administration tools for a single configured database.\n\
                \n\
                ## Results\n\
                Every tool returns {success, data, error, timestamp}. Check `success` before reading `data`.\n\
                \n\
                ## Workflow\n\
                1. `list_tables` and `describe_table` to learn the schema\n\
                2. `read_query` for SELECT statements, `write_query` for INSERT/UPDATE/DELETE\n\
                3. `create_table`, `alter_table`, `drop_table` for schema changes\n\
                4. `export_query` to get results as JSON or CSV text\n\
                5. `append_insight` / `list_insights` to keep notes about tables\n\
                \n\
                ## Parameters\n\
                Never splice values into SQL. Use ? placeholders with a `params` array,\n\
                or :name placeholders with a `params` object."
                    .to_string(),
            ),
        }
    }
}

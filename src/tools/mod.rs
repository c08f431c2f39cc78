//! Tool implementations.
//!
//! This module contains all database tool handlers:
//! - `schema`: `list_tables` and `describe_table`
//! - `query`: `read_query` for SELECT statements
//! - `write`: `write_query` for INSERT/UPDATE/DELETE in a transaction
//! - `ddl`: `create_table`, `alter_table`, `drop_table`
//! - `export`: `export_query` to JSON or CSV
//! - `insight`: `append_insight` and `list_insights`
//! - `sql_validator`: statement classification for the data tools

pub mod ddl;
pub mod export;
pub mod format;
pub mod insight;
pub mod query;
pub mod schema;
pub mod sql_validator;
pub mod write;

pub use ddl::{
    AlterTableInput, AlterTableOutput, CreateTableInput, DdlToolHandler, DropTableInput,
    TableStatementOutput,
};
pub use export::{ExportQueryInput, ExportQueryOutput, ExportToolHandler};
pub use format::ExportFormat;
pub use insight::{
    AppendInsightInput, AppendInsightOutput, InsightToolHandler, ListInsightsInput,
    ListInsightsOutput,
};
pub use query::{QueryToolHandler, ReadQueryInput, ReadQueryOutput};
pub use schema::{
    DescribeTableInput, DescribeTableOutput, ListTablesInput, ListTablesOutput, SchemaToolHandler,
};
pub use write::{WriteQueryInput, WriteQueryOutput, WriteToolHandler};

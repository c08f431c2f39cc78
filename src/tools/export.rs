//! Export tool.
//!
//! Runs a read-only query and serializes the rows as JSON or CSV.

use crate::db::ConnectionProvider;
use crate::error::DbResult;
use crate::models::QueryParams;
use crate::tools::format::ExportFormat;
use crate::tools::query::QueryToolHandler;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

fn default_format() -> String {
    ExportFormat::default().to_string()
}

/// Input for the export_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExportQueryInput {
    /// SQL SELECT statement whose results are exported
    pub query: String,
    /// "json" (default) or "csv", case-insensitive
    #[serde(default = "default_format")]
    pub format: String,
    /// Values bound to ? or :name placeholders
    #[serde(default)]
    pub params: Option<QueryParams>,
}

/// Output from the export_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExportQueryOutput {
    pub format: ExportFormat,
    /// The serialized result set
    pub data: String,
    pub row_count: usize,
}

pub struct ExportToolHandler {
    reader: QueryToolHandler,
}

impl ExportToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self {
            reader: QueryToolHandler::new(provider),
        }
    }

    pub async fn export_query(&self, input: ExportQueryInput) -> DbResult<ExportQueryOutput> {
        // Format is checked before anything touches the database
        let format: ExportFormat = input.format.parse()?;

        let rows = self
            .reader
            .fetch_read_only("export_query", &input.query, input.params.as_ref())
            .await?;
        let data = format.render(&rows)?;

        info!(
            format = %format,
            row_count = rows.len(),
            bytes = data.len(),
            "Exported query results"
        );

        Ok(ExportQueryOutput {
            format,
            data,
            row_count: rows.len(),
        })
    }
}

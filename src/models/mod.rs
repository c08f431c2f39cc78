//! Data models for the SQL agent tool layer.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod descriptor;
pub mod insight;
pub mod query;
pub mod response;
pub mod schema;

// Re-export commonly used types
pub use connection::{
    ConnectionConfig, ConnectionConfigError, DEFAULT_ACQUIRE_TIMEOUT_SECS, DEFAULT_POOL_NAME,
    DEFAULT_POOL_SIZE, DEFAULT_QUERY_TIMEOUT_SECS,
};
pub use descriptor::{AlterationInput, Alteration, ColumnDescriptor};
pub use insight::{INSIGHTS_TABLE, InsightRecord};
pub use query::{QueryParam, QueryParams, Row};
pub use response::ToolResponse;
pub use schema::{ColumnInfo, IndexInfo};

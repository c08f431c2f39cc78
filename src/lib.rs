//! SQL Agent MCP Library
//!
//! A uniform tool layer over a MySQL database: schema inspection, DDL from
//! structured descriptors, parameterized reads and writes, export to JSON or
//! CSV, and an insight log. Every operation returns a
//! [`ToolResponse`](models::ToolResponse) envelope and is served as an MCP
//! tool.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use db::ConnectionProvider;
pub use error::DbError;
pub use mcp::SqlAgentService;
pub use models::ToolResponse;

//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection provider over a single MySQL pool
//! - Query execution with timeouts
//! - Parameter resolution and binding
//! - Schema introspection
//! - Row to JSON type mappings

pub mod executor;
pub mod params;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::{QueryExecutor, WriteOutcome};
pub use params::resolve_params;
pub use pool::ConnectionProvider;
pub use schema::{SchemaInspector, quote_identifier};
pub use types::RowToJson;

//! Schema introspection module.
//!
//! Uses MySQL's `SHOW` statements rather than `information_schema` so the
//! result shapes match what the server reports for the current database.

use crate::db::executor::QueryExecutor;
use crate::error::DbResult;
use crate::models::{ColumnInfo, IndexInfo};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlConnection, Row};
use tracing::debug;

mod queries {
    pub const LIST_TABLES: &str = "SHOW TABLES";
    pub const LIST_TABLES_FROM: &str = "SHOW TABLES FROM";
    pub const DESCRIBE: &str = "DESCRIBE";
    pub const SHOW_INDEX_FROM: &str = "SHOW INDEX FROM";
}

/// Quote a MySQL identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Schema inspector for database introspection.
#[derive(Debug, Clone, Copy)]
pub struct SchemaInspector {
    executor: QueryExecutor,
}

impl SchemaInspector {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// List table names in the current database, or in `schema` when given.
    pub async fn list_tables(
        &self,
        conn: &mut MySqlConnection,
        schema: Option<&str>,
    ) -> DbResult<Vec<String>> {
        let sql = match schema {
            Some(s) => format!("{} {}", queries::LIST_TABLES_FROM, quote_identifier(s)),
            None => queries::LIST_TABLES.to_string(),
        };

        let rows = self.executor.fetch_rows(conn, &sql, &[]).await?;
        // SHOW TABLES returns a single column named "Tables_in_<db>"
        let tables: Vec<String> = rows
            .iter()
            .filter_map(|row| get_string_by_index(row, 0))
            .collect();

        debug!(count = tables.len(), schema = ?schema, "Listed tables");
        Ok(tables)
    }

    /// Column structure as reported by `DESCRIBE`, in ordinal order.
    pub async fn describe_columns(
        &self,
        conn: &mut MySqlConnection,
        table_name: &str,
    ) -> DbResult<Vec<ColumnInfo>> {
        let sql = format!("{} {}", queries::DESCRIBE, quote_identifier(table_name));
        let rows = self.executor.fetch_rows(conn, &sql, &[]).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let field = get_string(row, "Field");
                let column_type = get_string(row, "Type");
                let nullable = get_string(row, "Null");
                let key = get_optional_string(row, "Key");
                let default = get_optional_string(row, "Default");
                let extra = get_optional_string(row, "Extra");

                let mut col = ColumnInfo::new(field, column_type, nullable == "YES");
                if let Some(k) = key.filter(|k| !k.is_empty()) {
                    col = col.with_key(k);
                }
                if let Some(d) = default {
                    col = col.with_default(d);
                }
                if let Some(e) = extra.filter(|e| !e.is_empty()) {
                    col = col.with_extra(e);
                }
                col
            })
            .collect())
    }

    /// Index entries as reported by `SHOW INDEX`, one per indexed column.
    pub async fn describe_indexes(
        &self,
        conn: &mut MySqlConnection,
        table_name: &str,
    ) -> DbResult<Vec<IndexInfo>> {
        let sql = format!(
            "{} {}",
            queries::SHOW_INDEX_FROM,
            quote_identifier(table_name)
        );
        let rows = self.executor.fetch_rows(conn, &sql, &[]).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let name = get_string(row, "Key_name");
                let column = get_optional_string(row, "Column_name");
                let non_unique = try_get_u64(row, "Non_unique").unwrap_or(1);
                let seq = try_get_u64(row, "Seq_in_index").unwrap_or(1);
                let index_type = get_optional_string(row, "Index_type");

                let mut idx = IndexInfo::new(name, column)
                    .with_unique(non_unique == 0)
                    .with_seq_in_index(seq);
                if let Some(t) = index_type.filter(|t| !t.is_empty()) {
                    idx = idx.with_index_type(t);
                }
                idx
            })
            .collect())
    }
}

// =============================================================================
// Row helpers
// =============================================================================
//
// MySQL may return VARBINARY instead of VARCHAR for SHOW output depending on
// charset configuration, and integer widths differ between server versions.

/// Try to get a u64 value from a row.
/// MySQL 5.x may return BIGINT (i64), MySQL 8.x returns BIGINT UNSIGNED (u64).
fn try_get_u64(row: &MySqlRow, column: &str) -> Option<u64> {
    if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(column) {
        return Some(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(column) {
        return Some(v as u64);
    }
    if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(column) {
        return Some(v as u64);
    }
    None
}

fn get_string(row: &MySqlRow, column: &str) -> String {
    get_optional_string(row, column).unwrap_or_default()
}

fn get_optional_string(row: &MySqlRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .or_else(|| {
            row.try_get::<Option<Vec<u8>>, _>(column)
                .ok()
                .flatten()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
}

fn get_string_by_index(row: &MySqlRow, index: usize) -> Option<String> {
    row.try_get::<String, _>(index).ok().or_else(|| {
        row.try_get::<Vec<u8>, _>(index)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("order items"), "`order items`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_list_tables_from_schema_sql() {
        let sql = format!("{} {}", queries::LIST_TABLES_FROM, quote_identifier("shop"));
        assert_eq!(sql, "SHOW TABLES FROM `shop`");
    }
}

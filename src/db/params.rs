//! Parameter binding utilities.
//!
//! Values are always bound by the driver, never interpolated into SQL text.
//! Named `:name` placeholders are rewritten to MySQL's positional `?` before
//! binding.

use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryParams};
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::types::Json;

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::UInt(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
        QueryParam::Json(v) => query.bind(Json(v)),
    }
}

/// Resolve caller parameters into the SQL text to send and the ordered values
/// to bind.
///
/// Positional values must match the number of `?` placeholders. Named values
/// are looked up for every `:name` placeholder; unused names are ignored.
pub fn resolve_params(
    sql: &str,
    params: Option<&QueryParams>,
) -> DbResult<(String, Vec<QueryParam>)> {
    match params {
        None => Ok((sql.to_string(), Vec::new())),
        Some(QueryParams::Positional(values)) => {
            let placeholders = scan_placeholders(sql);
            if !placeholders.names.is_empty() {
                return Err(DbError::validation(format!(
                    "Query uses named placeholder ':{}' but params is an array. Pass params as an object",
                    placeholders.names[0]
                )));
            }
            if placeholders.positional != values.len() {
                return Err(DbError::validation(format!(
                    "Query has {} ? placeholder(s) but {} value(s) were given",
                    placeholders.positional,
                    values.len()
                )));
            }
            Ok((sql.to_string(), values.iter().map(QueryParam::from).collect()))
        }
        Some(QueryParams::Named(values)) => {
            let placeholders = scan_placeholders(sql);
            if placeholders.positional > 0 {
                return Err(DbError::validation(
                    "Query mixes ? and :name placeholders. Use one style",
                ));
            }
            let bound = placeholders
                .names
                .iter()
                .map(|name| {
                    values.get(name).map(QueryParam::from).ok_or_else(|| {
                        DbError::validation(format!(
                            "Missing value for named parameter ':{}'",
                            name
                        ))
                    })
                })
                .collect::<DbResult<Vec<_>>>()?;
            Ok((placeholders.sql, bound))
        }
    }
}

/// Placeholders found outside quotes and comments.
#[derive(Debug, Default, PartialEq, Eq)]
struct Placeholders {
    /// SQL with every `:name` rewritten to `?`
    sql: String,
    /// Names in order of appearance
    names: Vec<String>,
    /// Count of `?` already present in the input
    positional: usize,
}

/// Scan for `?` and `:name` placeholders. Quoted strings, quoted identifiers,
/// comments (`-- `, `#`, `/* */`) and `::` are copied through untouched.
fn scan_placeholders(sql: &str) -> Placeholders {
    let chars: Vec<char> = sql.chars().collect();
    let mut found = Placeholders {
        sql: String::with_capacity(sql.len()),
        ..Default::default()
    };
    let out = &mut found.sql;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            '\'' | '"' | '`' => {
                let end = quoted_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '#' => {
                let end = line_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            // MySQL needs whitespace (or end of input) after `--`
            '-' if next == Some('-')
                && chars.get(i + 2).is_none_or(|c| c.is_whitespace() || c.is_control()) =>
            {
                let end = line_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '/' if next == Some('*') => {
                let end = block_comment_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '?' => {
                found.positional += 1;
                out.push(c);
                i += 1;
            }
            ':' if next == Some(':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if next.is_some_and(is_name_start) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                found.names.push(chars[start..end].iter().collect());
                out.push('?');
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    found
}

/// Index just past the closing quote of the literal starting at `start`.
/// Backslash escapes apply inside string literals, not identifiers.
fn quoted_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '\\' && quote != '`' {
            i += 2;
            continue;
        }
        if chars[i] == quote {
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// Index of the newline ending the comment at `start`, or the end of input.
fn line_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(chars.len(), |offset| start + offset)
}

fn block_comment_end(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
